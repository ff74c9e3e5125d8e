//! Event identifiers and diffractive kinematics for generated events
//!
//! Events are read from Les Houches Event Files. For each event the
//! final-state particles are split at the largest rapidity gap and the
//! momentum loss estimates ξ of the two resulting systems are written
//! to a flat table together with the event identifiers, generator
//! information and in-time pileup.
//!
//! # Example
//!
//! ```rust,no_run
//! use rapgap::{Delimiter, LhefSource, Summarizer, TableWriter};
//!
//! let reader = rapgap::open("events.lhe.gz").unwrap();
//! let mut source = LhefSource::new(reader);
//! let mut writer = TableWriter::new(std::io::stdout(), Delimiter::Tab).unwrap();
//! let mut summarizer = Summarizer::new();
//! rapgap::process(&mut source, &mut summarizer, &mut writer).unwrap();
//! ```
#[macro_use]
extern crate itertools;

pub mod data;
mod error;
pub mod momentum;
pub mod reader;
pub mod source;
pub mod status;
pub mod summary;
mod tags;
pub mod writer;
pub mod xi;

pub use data::*;
pub use error::{Error, Result};
pub use momentum::FourMomentum;
pub use reader::*;
pub use source::*;
pub use summary::*;
pub use writer::*;
pub use xi::{estimate, BeamPair, GapSplit, Xi};

/// Summarise all events of a source
///
/// Returns the number of rows written. The writer is not finished, so
/// several sources can be appended to the same output.
pub fn process<S, W>(source: &mut S, summarizer: &mut Summarizer, writer: &mut W) -> Result<u64>
where
    S: EventSource + ?Sized,
    W: ColumnWriter + ?Sized,
{
    let mut rows = 0;
    while let Some(event) = source.next_event()? {
        let row = summarizer.summarize(&event)?;
        writer.write_row(&row)?;
        rows += 1;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::TWO_JETS;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    struct Recorded(std::vec::IntoIter<SourceEvent>);

    impl EventSource for Recorded {
        fn next_event(&mut self) -> Result<Option<SourceEvent>> {
            Ok(self.0.next())
        }
    }

    #[test]
    fn lhef_to_table() {
        let mut source = LhefSource::new(Reader::new(Cursor::new(TWO_JETS)).unwrap());
        let mut summarizer = Summarizer::new();
        let mut writer = TableWriter::new(Vec::new(), Delimiter::Comma).unwrap();
        let rows = process(&mut source, &mut summarizer, &mut writer).unwrap();
        writer.finish().unwrap();
        assert_eq!(rows, 2);
        assert_eq!(summarizer.stats().without_pileup, 1);
        assert!(summarizer.pileup_warned());

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,1,1,84515.12,0.1190024,91.188,1,"));
        assert!(lines[2].starts_with("7,12,345,1.5,0.13,10.0,2,0.0,0.0,0.0,0.0,"));
        assert!(lines[2].ends_with(",21.25,23.0"));
    }

    #[test]
    fn incomplete_pileup_keeps_event() {
        let text = TWO_JETS.replace(
            "<pileup bx=\"0\" true=\"21.25\" num=\"23\"/>",
            "<pileup bx=\"0\" true=\"21.25\"/>",
        );
        let mut source = LhefSource::new(Reader::new(Cursor::new(text)).unwrap());
        let mut summarizer = Summarizer::new();
        let mut rows: Vec<EventSummary> = Vec::new();
        assert_eq!(process(&mut source, &mut summarizer, &mut rows).unwrap(), 2);
        assert_eq!(summarizer.stats().without_pileup, 2);
        assert!(summarizer.pileup_warned());
        assert_eq!(rows[1].event, 345);
        assert_eq!(rows[1].pu_true_num_interactions, 0.);
        assert_eq!(rows[1].pu_num_interactions, 0.);
    }

    #[test]
    fn two_jet_xi() {
        let mut source = LhefSource::new(Reader::new(Cursor::new(TWO_JETS)).unwrap());
        let mut rows: Vec<EventSummary> = Vec::new();
        process(&mut source, &mut Summarizer::new(), &mut rows).unwrap();

        // the gluon at y ≈ -4.0 and the quark at y ≈ -1.6 are each a
        // system of their own, both (nearly) massless
        let gluon = FourMomentum::new(37.283715118, 21.98166528, -1132.689358, 1133.5159684);
        let quark = FourMomentum::new(-37.283715118, -21.98166528, -102.90783056, 111.63910879);
        let s = 14000f64 * 14000.;
        assert_relative_eq!(rows[0].xix, (gluon.mass2() / s) as f32, epsilon = 1e-12);
        assert_relative_eq!(rows[0].xiy, (quark.mass2() / s) as f32, epsilon = 1e-12);
    }

    #[test]
    fn real_data_is_not_estimated() {
        let particles = vec![ParticleRecord {
            id: 211,
            status: status::FINAL_STATE,
            p: FourMomentum::new(1., 0., 2., 3.),
        }];
        let event = |event, is_real_data| SourceEvent {
            id: EventId {
                run: 9,
                lumi: 1,
                event,
            },
            is_real_data,
            generator: None,
            particles: particles.clone(),
            beams: None,
            pileup: None,
        };
        let mut source = Recorded(vec![event(1, true), event(2, true)].into_iter());
        let mut summarizer = Summarizer::new();
        let mut rows: Vec<EventSummary> = Vec::new();
        assert_eq!(process(&mut source, &mut summarizer, &mut rows).unwrap(), 2);
        assert_eq!(summarizer.stats().simulated(), 0);
        assert_eq!(rows[1], EventSummary::new(EventId { run: 9, lumi: 1, event: 2 }));

        let mut source = Recorded(vec![event(3, false)].into_iter());
        let err = process(&mut source, &mut summarizer, &mut rows).unwrap_err();
        assert!(matches!(err, Error::MissingGeneratorInfo(_)));
        assert_eq!(rows.len(), 2);
    }
}
