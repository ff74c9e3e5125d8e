//! One output row per event
use log::{trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::source::{EventId, PileupSummary, SourceEvent};
use crate::xi::GapSplit;
use crate::{Error, Result};

/// Type of an output column
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
}

/// Names and types of the output columns, in output order
pub const COLUMNS: [(&str, ColumnType); 13] = [
    ("run", ColumnType::Int),
    ("lumi", ColumnType::Int),
    ("event", ColumnType::Int),
    ("genWeight", ColumnType::Float),
    ("alphaQCD", ColumnType::Float),
    ("qScale", ColumnType::Float),
    ("processID", ColumnType::Int),
    ("Xix", ColumnType::Float),
    ("Xiy", ColumnType::Float),
    ("XiSD", ColumnType::Float),
    ("XiDD", ColumnType::Float),
    ("puTrueNumInteractions", ColumnType::Float),
    ("PUNumInteractions", ColumnType::Float),
];

/// Value of a single output cell
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    UInt(u64),
    Int(i32),
    Float(f32),
}

impl Value {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::UInt(_) | Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
        }
    }
}

/// Summary of one event
///
/// Columns that do not apply to an event keep their default value of zero.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EventSummary {
    pub run: u32,
    pub lumi: u32,
    pub event: u64,
    #[cfg_attr(feature = "serde", serde(rename = "genWeight"))]
    pub gen_weight: f32,
    #[cfg_attr(feature = "serde", serde(rename = "alphaQCD"))]
    pub alpha_qcd: f32,
    #[cfg_attr(feature = "serde", serde(rename = "qScale"))]
    pub q_scale: f32,
    #[cfg_attr(feature = "serde", serde(rename = "processID"))]
    pub process_id: i32,
    #[cfg_attr(feature = "serde", serde(rename = "Xix"))]
    pub xix: f32,
    #[cfg_attr(feature = "serde", serde(rename = "Xiy"))]
    pub xiy: f32,
    #[cfg_attr(feature = "serde", serde(rename = "XiSD"))]
    pub xisd: f32,
    #[cfg_attr(feature = "serde", serde(rename = "XiDD"))]
    pub xidd: f32,
    #[cfg_attr(feature = "serde", serde(rename = "puTrueNumInteractions"))]
    pub pu_true_num_interactions: f32,
    #[cfg_attr(feature = "serde", serde(rename = "PUNumInteractions"))]
    pub pu_num_interactions: f32,
}

impl EventSummary {
    pub fn new(id: EventId) -> Self {
        Self {
            run: id.run,
            lumi: id.lumi,
            event: id.event,
            ..Default::default()
        }
    }

    /// Cell values in the order of [`COLUMNS`]
    pub fn values(&self) -> [Value; 13] {
        use Value::*;
        [
            UInt(self.run.into()),
            UInt(self.lumi.into()),
            UInt(self.event),
            Float(self.gen_weight),
            Float(self.alpha_qcd),
            Float(self.q_scale),
            Int(self.process_id),
            Float(self.xix),
            Float(self.xiy),
            Float(self.xisd),
            Float(self.xidd),
            Float(self.pu_true_num_interactions),
            Float(self.pu_num_interactions),
        ]
    }
}

/// Counters collected over a run
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// All summarised events
    pub events: u64,
    /// Real data events, which only get identifiers
    pub real_data: u64,
    /// Simulated events without any pileup information
    pub without_pileup: u64,
}

impl RunStats {
    /// Events that went through the rapidity gap estimator
    pub fn simulated(&self) -> u64 {
        self.events - self.real_data
    }
}

/// Builds the summary rows of one run
#[derive(Debug, Default)]
pub struct Summarizer {
    pileup_warned: bool,
    stats: RunStats,
}

impl Summarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarise one event
    ///
    /// For real data only the event identifiers are filled. Simulated
    /// events without generator information or beams are rejected.
    pub fn summarize(&mut self, event: &SourceEvent) -> Result<EventSummary> {
        let mut row = EventSummary::new(event.id);
        if event.is_real_data {
            self.stats.events += 1;
            self.stats.real_data += 1;
            return Ok(row);
        }

        let generator = event
            .generator
            .ok_or(Error::MissingGeneratorInfo(event.id))?;
        let beams = event.beams.ok_or(Error::MissingBeams(event.id))?;
        self.stats.events += 1;
        row.gen_weight = generator.weight as f32;
        row.alpha_qcd = generator.alpha_qcd as f32;
        row.q_scale = generator.q_scale as f32;
        row.process_id = generator.process_id;

        let split = GapSplit::new(event.final_state());
        let xi = split.xi(&beams);
        trace!(
            "Event {}: gap {:?} between {} and {} particles, {xi:?}",
            event.id,
            split.gap(),
            split.x_system().len(),
            split.y_system().len(),
        );
        row.xix = xi.x as f32;
        row.xiy = xi.y as f32;
        row.xisd = xi.sd as f32;
        row.xidd = xi.dd as f32;

        match &event.pileup {
            Some(pileup) => {
                if let Some(in_time) = in_time_pileup(pileup) {
                    row.pu_true_num_interactions = in_time.true_num_interactions;
                    row.pu_num_interactions = in_time.num_interactions;
                }
            }
            None => self.missing_pileup(event.id),
        }
        Ok(row)
    }

    fn missing_pileup(&mut self, id: EventId) {
        self.stats.without_pileup += 1;
        if !self.pileup_warned {
            warn!(
                "No pileup information for event {id}. \
                 This is expected for generator-level samples; \
                 pileup columns are left at zero."
            );
            self.pileup_warned = true;
        }
    }

    /// Whether the missing pileup warning has been issued
    pub fn pileup_warned(&self) -> bool {
        self.pileup_warned
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }
}

/// Pileup summary of the triggered bunch crossing
pub fn in_time_pileup(summaries: &[PileupSummary]) -> Option<&PileupSummary> {
    summaries.iter().find(|s| s.bunch_crossing == 0)
}
