use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rapgap::{
    estimate, BeamPair, Delimiter, FourMomentum, LhefSource, Reader, Summarizer, TableWriter,
};

const NPARTICLES: usize = 200;
const NEVENTS: usize = 500;

fn particles(n: usize) -> Vec<FourMomentum> {
    (0..n)
        .map(|i| {
            let y = ((i * 7919) % 997) as f64 / 997. * 16. - 8.;
            let pt = 0.2 + (i % 13) as f64 * 0.1;
            let mt = (0.13957f64.powi(2) + pt * pt).sqrt();
            FourMomentum::new(pt, 0., mt * y.sinh(), mt * y.cosh())
        })
        .collect()
}

fn lhef(nevents: usize) -> String {
    let mut text = String::from(
        "<LesHouchesEvents version=\"3.0\">\n<init>\n\
         2212 2212 6500.0 6500.0 0 0 0 0 3 1\n1.0 0.0 1.0 1\n</init>\n",
    );
    let particles = particles(NPARTICLES);
    for _ in 0..nevents {
        text += &format!("<event>\n{NPARTICLES} 1 1.0 10.0 0.0078 0.13\n");
        for p in &particles {
            text += &format!(
                "211 1 0 0 0 0 {} {} {} {} 0.13957 0.0 9.0\n",
                p.px, p.py, p.pz, p.e
            );
        }
        text += "</event>\n";
    }
    text += "</LesHouchesEvents>\n";
    text
}

fn criterion_benchmark(c: &mut Criterion) {
    let beams = BeamPair::new(
        FourMomentum::new(0., 0., 6500., 6500.),
        FourMomentum::new(0., 0., -6500., 6500.),
    );
    let event = particles(NPARTICLES);
    c.bench_function("estimate", |b| {
        b.iter(|| estimate(black_box(&event), black_box(&beams)))
    });

    let text = lhef(NEVENTS);
    c.bench_function("summarize", |b| {
        b.iter(|| {
            let reader = Reader::new(Cursor::new(text.as_str())).unwrap();
            let mut source = LhefSource::new(reader);
            let mut writer = TableWriter::new(std::io::sink(), Delimiter::Tab).unwrap();
            let rows = rapgap::process(&mut source, &mut Summarizer::new(), &mut writer).unwrap();
            assert_eq!(rows, NEVENTS as u64);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
