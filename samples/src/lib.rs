use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleErrors {
    #[error("could not open sample file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read sample file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}:{line}: expected 2 columns, found {found}", .path.display())]
    ColumnCount {
        path: PathBuf,
        line: usize,
        found: usize,
    },
    #[error("{}:{line}: could not parse '{token}' as {kind}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
        kind: &'static str,
    },
    #[error("could not write sample file {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },
    #[error("could not flush sample file {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One measurement curve: entry counts on x and the measured value on y,
/// kept in file order. Point order is the order the curve is drawn in.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub x: Vec<i64>,
    pub y: Vec<f64>,
    xmin: i64,
    xmax: i64,
    ymin: f64,
    ymax: f64,
}

impl Series {
    pub fn new(x: Vec<i64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        let xmin = x.iter().copied().min().unwrap_or(0);
        let xmax = x.iter().copied().max().unwrap_or(0);
        let ymin = y.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let ymax = y.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        Self {
            x,
            y,
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.x
            .iter()
            .copied()
            .zip(self.y.iter().copied())
    }

    pub fn xmin(&self) -> i64 {
        self.xmin
    }

    pub fn xmax(&self) -> i64 {
        self.xmax
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Writes the series back out in the sample-file format, one `<x> <y>`
    /// record per point.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SampleErrors> {
        let mut writer = SampleWriter::create(path)?;
        for (x, y) in self.points() {
            writer.write_sample(x, y)?;
        }
        writer.flush()
    }
}

/// Ordered collection of series sharing one chart. Tracks the global x/y
/// extent as series are inserted so the axes can be sized in one pass.
#[derive(Debug)]
pub struct SeriesSet {
    series: Vec<Series>,
    xmin: i64,
    xmax: i64,
    ymin: f64,
    ymax: f64,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            xmin: i64::MAX,
            xmax: i64::MIN,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
        }
    }

    pub fn insert(&mut self, series: Series) {
        if series.xmin < self.xmin {
            self.xmin = series.xmin;
        }
        if series.xmax > self.xmax {
            self.xmax = series.xmax;
        }
        if series.ymin < self.ymin {
            self.ymin = series.ymin;
        }
        if series.ymax > self.ymax {
            self.ymax = series.ymax;
        }

        self.series.push(series);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Series> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn xmin(&self) -> i64 {
        self.xmin
    }

    pub fn xmax(&self) -> i64 {
        self.xmax
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }
}

impl Default for SeriesSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a sample file into a [`Series`].
///
/// Each non-empty line holds two whitespace-separated columns, an integer
/// entry count and a float measurement. The first malformed line aborts the
/// load with a line-numbered error.
pub fn load(path: impl AsRef<Path>) -> Result<Series, SampleErrors> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SampleErrors::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SampleErrors::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.is_empty() {
            continue;
        }
        if columns.len() != 2 {
            return Err(SampleErrors::ColumnCount {
                path: path.to_path_buf(),
                line: index + 1,
                found: columns.len(),
            });
        }
        let entry = columns[0]
            .parse::<i64>()
            .map_err(|_| SampleErrors::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                token: columns[0].to_string(),
                kind: "an integer",
            })?;
        let value = columns[1]
            .parse::<f64>()
            .map_err(|_| SampleErrors::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                token: columns[1].to_string(),
                kind: "a float",
            })?;
        x.push(entry);
        y.push(value);
    }

    Ok(Series::new(x, y))
}

/// Streams `<x> <y>` records to a sample file through a buffered
/// space-delimited writer.
pub struct SampleWriter {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
}

impl SampleWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SampleErrors> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SampleErrors::FileAccess {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = File::create(path).map_err(|source| SampleErrors::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = WriterBuilder::new()
            .delimiter(b' ')
            .from_writer(BufWriter::new(file));
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn write_sample(&mut self, x: i64, y: f64) -> Result<(), SampleErrors> {
        self.writer
            .write_record([x.to_string(), y.to_string()])
            .map_err(|source| SampleErrors::Write {
                path: self.path.clone(),
                source,
            })
    }

    pub fn flush(&mut self) -> Result<(), SampleErrors> {
        self.writer
            .flush()
            .map_err(|source| SampleErrors::Flush {
                path: self.path.clone(),
                source,
            })
    }
}
