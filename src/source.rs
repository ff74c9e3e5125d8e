//! Per-event input records and the LHEF event source
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use flate2::bufread::MultiGzDecoder;
use log::debug;
use xmltree::XMLNode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{XmlAttr, HEPEUP};
use crate::momentum::FourMomentum;
use crate::reader::{Reader, XmlTree};
use crate::status::is_final_state;
use crate::tags::PILEUP_TAG;
use crate::xi::BeamPair;
use crate::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Run, luminosity block and event number
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventId {
    pub run: u32,
    pub lumi: u32,
    pub event: u64,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.run, self.lumi, self.event)
    }
}

/// Generator-level event information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GeneratorInfo {
    pub weight: f64,
    pub alpha_qcd: f64,
    /// Scale in GeV
    pub q_scale: f64,
    pub process_id: i32,
}

impl From<&HEPEUP> for GeneratorInfo {
    fn from(event: &HEPEUP) -> Self {
        Self {
            weight: event.XWGTUP,
            alpha_qcd: event.AQCDUP,
            q_scale: event.SCALUP,
            process_id: event.IDRUP,
        }
    }
}

/// A generated particle
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ParticleRecord {
    /// PDG particle ID
    pub id: i32,
    pub status: i32,
    pub p: FourMomentum,
}

/// Pileup interactions in one bunch crossing
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PileupSummary {
    /// Bunch crossing relative to the triggered one
    pub bunch_crossing: i32,
    /// Mean number of interactions the pileup was sampled from
    pub true_num_interactions: f32,
    /// Actual number of pileup interactions
    pub num_interactions: f32,
}

/// Everything an event source provides for one event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceEvent {
    pub id: EventId,
    pub is_real_data: bool,
    /// Only present for simulated events
    pub generator: Option<GeneratorInfo>,
    pub particles: Vec<ParticleRecord>,
    pub beams: Option<BeamPair>,
    /// `None` if the source has no pileup information for this event
    pub pileup: Option<Vec<PileupSummary>>,
}

impl SourceEvent {
    /// Momenta of all final-state particles in their original order
    pub fn final_state(&self) -> impl Iterator<Item = FourMomentum> + '_ {
        self.particles
            .iter()
            .filter(|p| is_final_state(p.status))
            .map(|p| p.p)
    }
}

/// Stream of events
pub trait EventSource {
    /// Get the next event, or `None` once the source is exhausted
    fn next_event(&mut self) -> Result<Option<SourceEvent>>;
}

/// Event source reading Les Houches Event Files
///
/// LHEF files contain generated events only. Event identifiers are taken
/// from `run`, `lumi`, and `event` attributes of the `<event>` tag where
/// present. Otherwise the configured run and luminosity block are used
/// and events are numbered consecutively.
#[derive(Debug)]
pub struct LhefSource<T> {
    reader: Reader<T>,
    run: u32,
    lumi: u32,
    next_event: u64,
}

impl<T: BufRead> LhefSource<T> {
    pub fn new(reader: Reader<T>) -> Self {
        Self {
            reader,
            run: 1,
            lumi: 1,
            next_event: 1,
        }
    }

    /// Run number for events without a `run` attribute
    pub fn with_run(mut self, run: u32) -> Self {
        self.run = run;
        self
    }

    /// Luminosity block for events without a `lumi` attribute
    pub fn with_lumi(mut self, lumi: u32) -> Self {
        self.lumi = lumi;
        self
    }

    /// Number of the first event without an `event` attribute
    pub fn with_first_event(mut self, event: u64) -> Self {
        self.next_event = event;
        self
    }

    /// Number the next event without an `event` attribute would get
    pub fn next_event_number(&self) -> u64 {
        self.next_event
    }

    pub fn reader(&self) -> &Reader<T> {
        &self.reader
    }

    fn convert(&mut self, event: HEPEUP) -> Result<SourceEvent> {
        let number = self.next_event;
        self.next_event += 1;
        let id = EventId {
            run: attr_or(&event.attr, "run", self.run)?,
            lumi: attr_or(&event.attr, "lumi", self.lumi)?,
            event: attr_or(&event.attr, "event", number)?,
        };
        let beams = event.beams().unwrap_or_else(|| self.reader.heprup().beams());
        let pileup = pileup_from_info(&event.info);
        let particles = izip!(&event.IDUP, &event.ISTUP, &event.PUP)
            .map(|(&id, &status, p)| ParticleRecord {
                id,
                status,
                p: FourMomentum::from_pup(p),
            })
            .collect();
        Ok(SourceEvent {
            id,
            is_real_data: false,
            generator: Some(GeneratorInfo::from(&event)),
            particles,
            beams: Some(beams),
            pileup,
        })
    }
}

impl<T: BufRead> EventSource for LhefSource<T> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>> {
        match self.reader.hepeup()? {
            Some(event) => self.convert(event).map(Some),
            None => Ok(None),
        }
    }
}

/// Open a plain or gzip-compressed LHEF file
pub fn open<P: AsRef<Path>>(path: P) -> Result<Reader<Box<dyn BufRead>>> {
    let mut file = BufReader::new(File::open(path)?);
    let stream: Box<dyn BufRead> = if file.fill_buf()?.starts_with(&GZIP_MAGIC) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(file)
    };
    Reader::new(stream)
}

fn attr_or<N: FromStr>(attr: &XmlAttr, name: &str, default: N) -> Result<N> {
    match attr.get(name) {
        None => Ok(default),
        Some(value) => parse_attr(name, value),
    }
}

fn parse_attr<N: FromStr>(name: &str, value: &str) -> Result<N> {
    value.trim().parse().map_err(|_| Error::InvalidAttribute {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}

/// Collect `<pileup bx=".." true=".." num=".."/>` entries from the
/// optional event information
///
/// Returns `None` if there are no such entries, or if any of them cannot
/// be read. The event is then treated as having no pileup information.
fn pileup_from_info(info: &str) -> Option<Vec<PileupSummary>> {
    if !info.contains(PILEUP_TAG) {
        return None;
    }
    let wrapped = format!("<info>{info}</info>");
    let tree = match XmlTree::parse(wrapped.as_bytes()) {
        Ok(tree) => tree,
        Err(err) => {
            debug!("Ignoring event information that is not xml: {err}");
            return None;
        }
    };
    let mut summaries = Vec::new();
    for node in &tree.children {
        let XMLNode::Element(element) = node else {
            continue;
        };
        if element.name != PILEUP_TAG {
            continue;
        }
        match pileup_entry(&element.attributes) {
            Ok(summary) => summaries.push(summary),
            Err(err) => {
                debug!("Ignoring pileup information: {err}");
                return None;
            }
        }
    }
    (!summaries.is_empty()).then_some(summaries)
}

fn pileup_entry(attributes: &XmlAttr) -> Result<PileupSummary> {
    let get = |name: &str| {
        attributes.get(name).ok_or_else(|| Error::InvalidAttribute {
            name: name.to_owned(),
            value: String::new(),
        })
    };
    Ok(PileupSummary {
        bunch_crossing: parse_attr("bx", get("bx")?)?,
        true_num_interactions: parse_attr("true", get("true")?)?,
        num_interactions: parse_attr("num", get("num")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::TWO_JETS;
    use crate::status::{INCOMING, INCOMING_BEAM, OUTGOING};
    use std::io::{Cursor, Write};

    fn source() -> LhefSource<Cursor<&'static str>> {
        LhefSource::new(Reader::new(Cursor::new(TWO_JETS)).unwrap())
    }

    #[test]
    fn lhef_events() {
        let mut source = source().with_run(3).with_first_event(10);
        let first = source.next_event().unwrap().unwrap();
        assert_eq!(
            first.id,
            EventId {
                run: 3,
                lumi: 1,
                event: 10
            }
        );
        assert!(!first.is_real_data);
        let generator = first.generator.unwrap();
        assert_eq!(generator.weight, 84515.12);
        assert_eq!(generator.alpha_qcd, 0.1190024);
        assert_eq!(generator.q_scale, 91.188);
        assert_eq!(generator.process_id, 1);
        let status = first.particles.iter().map(|p| p.status).collect::<Vec<_>>();
        assert_eq!(status, [INCOMING, INCOMING, OUTGOING, OUTGOING]);
        assert_eq!(first.particles[2].id, 21);
        assert_eq!(first.final_state().count(), 2);
        assert_eq!(first.final_state().next(), Some(first.particles[2].p));
        let beams = first.beams.unwrap();
        assert_eq!(beams.0[0], FourMomentum::new(0., 0., 7000., 7000.));
        assert_eq!(beams.0[1], FourMomentum::new(0., 0., -7000., 7000.));
        assert_eq!(first.pileup, None);

        let second = source.next_event().unwrap().unwrap();
        assert_eq!(
            second.id,
            EventId {
                run: 7,
                lumi: 12,
                event: 345
            }
        );
        assert_eq!(second.final_state().count(), 0);
        assert!(second
            .particles
            .iter()
            .all(|p| p.status == INCOMING_BEAM));
        assert_eq!(second.beams.unwrap().cm_energy(), 13000.);
        let pileup = second.pileup.unwrap();
        assert_eq!(pileup.len(), 2);
        assert_eq!(
            pileup[1],
            PileupSummary {
                bunch_crossing: 0,
                true_num_interactions: 21.25,
                num_interactions: 23.
            }
        );
        assert_eq!(source.next_event_number(), 12);
        assert!(source.next_event().unwrap().is_none());
    }

    #[test]
    fn bad_event_attribute() {
        let text = TWO_JETS.replace("run=\"7\"", "run=\"seven\"");
        let mut source = LhefSource::new(Reader::new(Cursor::new(text)).unwrap());
        source.next_event().unwrap();
        let err = source.next_event().unwrap_err();
        assert_eq!(err.to_string(), "Invalid value 'seven' for attribute 'run'");
    }

    #[test]
    fn pileup_info() {
        assert_eq!(pileup_from_info(""), None);
        assert_eq!(pileup_from_info("# pileup & more"), None);
        assert_eq!(pileup_from_info("<mgrwt>\n</mgrwt>\n"), None);
        let pileup = pileup_from_info("<pileup bx=\"0\" true=\"1.5\" num=\"2\"/>\n").unwrap();
        assert_eq!(pileup[0].num_interactions, 2.);
        assert_eq!(pileup_from_info("<pileup bx=\"0\" true=\"1.5\"/>"), None);
        let info = "<pileup bx=\"-1\" true=\"1.5\" num=\"2\"/>\n\
                    <pileup bx=\"zero\" true=\"1.5\" num=\"2\"/>\n";
        assert_eq!(pileup_from_info(info), None);
    }

    #[test]
    fn incomplete_pileup_is_absent() {
        let text = TWO_JETS.replace(
            "<pileup bx=\"0\" true=\"21.25\" num=\"23\"/>",
            "<pileup bx=\"0\" true=\"21.25\"/>",
        );
        let mut source = LhefSource::new(Reader::new(Cursor::new(text)).unwrap());
        source.next_event().unwrap();
        let second = source.next_event().unwrap().unwrap();
        assert_eq!(second.id.event, 345);
        assert_eq!(second.pileup, None);
    }

    #[test]
    fn open_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("events.lhe");
        let zipped = dir.path().join("events.lhe.gz");
        std::fs::write(&plain, TWO_JETS).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(
            std::fs::File::create(&zipped).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(TWO_JETS.as_bytes()).unwrap();
        encoder.finish().unwrap();

        for path in [plain, zipped] {
            let mut source = LhefSource::new(open(&path).unwrap());
            assert_eq!(source.reader().heprup().EBMUP, [7000., 7000.]);
            let mut nevents = 0;
            while source.next_event().unwrap().is_some() {
                nevents += 1;
            }
            assert_eq!(nevents, 2);
        }
    }
}
