#![allow(dead_code)]

use coldash::chart::ChartSpec;
use coldash::config::AppConfig;
use coldash::error::RenderError;
use coldash::render::{ChartBackend, ChartInstance, RenderTarget, Theme};
use coldash::{Cell, Dashboard, Dataset};
use polars::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(contents).unwrap();
    path
}

pub fn write_gzip(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(contents).unwrap();
    encoder.finish().unwrap();
    path
}

/// CSV written by polars from a `df!` frame.
pub fn write_sales_csv(dir: &Path) -> PathBuf {
    let path = dir.join("sales.csv");
    let mut df = df!(
        "region" => ["north", "south", "north", "east", "south", "north"],
        "units" => [10i64, 4, 7, 12, 3, 9],
        "price" => [2.5f64, 3.0, 2.5, 1.75, 3.0, 2.25],
    )
    .unwrap();
    let mut file = File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
    path
}

/// `age` is numerical with one absent value, `city` categorical.
pub fn people() -> Dataset {
    Dataset::from_records(
        ["age", "city"],
        vec![
            vec![Cell::Number(25.0), "NY".into()],
            vec![Cell::Number(30.0), "NY".into()],
            vec![Cell::Absent, "LA".into()],
        ],
    )
    .unwrap()
}

/// Shared record of what a [`RecordingBackend`] did, in order.
#[derive(Default)]
pub struct Journal {
    pub events: Vec<String>,
    pub live: usize,
}

pub type SharedJournal = Rc<RefCell<Journal>>;

/// Backend that records `create`/`destroy` calls and can be told to fail for some columns.
pub struct RecordingBackend {
    journal: SharedJournal,
    failing: HashSet<String>,
}

impl RecordingBackend {
    pub fn new(journal: SharedJournal) -> Self {
        Self {
            journal,
            failing: HashSet::new(),
        }
    }

    pub fn failing_on(mut self, column: &str) -> Self {
        self.failing.insert(column.to_string());
        self
    }
}

struct RecordedChart {
    id: String,
    size: (u32, u32),
    spec: ChartSpec,
    journal: SharedJournal,
    live: bool,
}

impl ChartBackend for RecordingBackend {
    fn create(
        &mut self,
        target: &RenderTarget,
        spec: &ChartSpec,
        theme: &Theme,
    ) -> Result<Box<dyn ChartInstance>, RenderError> {
        if target.is_empty() {
            return Err(RenderError::EmptyTarget(target.id.clone()));
        }
        if self.failing.contains(&spec.column) {
            return Err(RenderError::Backend("canvas unavailable".into()));
        }
        let mut journal = self.journal.borrow_mut();
        journal.events.push(format!(
            "create {} {} {} {}x{}",
            spec.column,
            spec.kind,
            theme.mode.as_str(),
            target.width,
            target.height
        ));
        journal.live += 1;
        Ok(Box::new(RecordedChart {
            id: target.id.clone(),
            size: (target.width, target.height),
            spec: spec.clone(),
            journal: Rc::clone(&self.journal),
            live: true,
        }))
    }
}

impl ChartInstance for RecordedChart {
    fn target_id(&self) -> &str {
        &self.id
    }

    fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn destroy(&mut self) {
        if self.live {
            self.live = false;
            let mut journal = self.journal.borrow_mut();
            journal.events.push(format!("destroy {}", self.spec.column));
            journal.live -= 1;
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        Ok(b"png".to_vec())
    }

    fn to_eps(&self) -> Result<Vec<u8>, RenderError> {
        Ok(b"eps".to_vec())
    }
}

pub fn recording_dashboard() -> (Dashboard, SharedJournal) {
    let journal = SharedJournal::default();
    let backend = RecordingBackend::new(Rc::clone(&journal));
    let dashboard = Dashboard::new(&AppConfig::default(), Box::new(backend)).unwrap();
    (dashboard, journal)
}
