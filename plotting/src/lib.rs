use std::path::{Path, PathBuf};

use plotters::backend::BitMapBackend;
use plotters::prelude::*;
use samples::SeriesSet;
use show_image::{ImageInfo, ImageView, create_window, run_context};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderErrors {
    #[error("have {series} series but {labels} labels")]
    LabelCount { series: usize, labels: usize },
    #[error("series '{0}' has no points")]
    EmptySeries(String),
    #[error("chart drawing failed: {0}")]
    Draw(String),
    #[error("could not write image {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        source: image::ImageError,
    },
}

// Line colors cycled by series position.
const PALETTE: [RGBColor; 8] = [
    RED,
    BLUE,
    GREEN,
    MAGENTA,
    CYAN,
    BLACK,
    RGBColor(255, 165, 0),
    RGBColor(128, 0, 128),
];

// The y window is pinned to 0..7 with one tick per integer. Curves leaving
// that band are clipped, matching the historical display of these reports.
const Y_WINDOW: (f64, f64) = (0.0, 7.0);
const Y_TICKS: usize = 8;

/// Chart configuration. [`render`](Chart::render) draws a [`SeriesSet`] into
/// an RGB8 pixel buffer which can then be shown in a window or saved as a
/// PNG.
#[derive(Debug, Clone)]
pub struct Chart {
    width: usize,
    height: usize,
    caption: String,
    x_desc: String,
    y_desc: String,
}

impl Chart {
    pub fn new() -> Self {
        Self {
            width: 1200,
            height: 800,
            caption: String::new(),
            x_desc: String::new(),
            y_desc: String::new(),
        }
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_caption(mut self, caption: &str) -> Self {
        self.caption = caption.to_string();
        self
    }

    pub fn with_x_desc(mut self, desc: &str) -> Self {
        self.x_desc = desc.to_string();
        self
    }

    pub fn with_y_desc(mut self, desc: &str) -> Self {
        self.y_desc = desc.to_string();
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Draws one line per series, in collection order, with a legend entry
    /// per label. Returns the rendered RGB8 buffer (3 bytes per pixel).
    pub fn render(&self, set: &SeriesSet, labels: &[&str]) -> Result<Vec<u8>, RenderErrors> {
        if set.len() != labels.len() {
            return Err(RenderErrors::LabelCount {
                series: set.len(),
                labels: labels.len(),
            });
        }
        for (series, label) in set.iter().zip(labels) {
            if series.is_empty() {
                return Err(RenderErrors::EmptySeries(label.to_string()));
            }
        }

        let mut buffer = vec![0u8; self.width * self.height * 3];
        self.draw(set, labels, &mut buffer)
            .map_err(|e| RenderErrors::Draw(e.to_string()))?;
        Ok(buffer)
    }

    fn draw(
        &self,
        set: &SeriesSet,
        labels: &[&str],
        buffer: &mut [u8],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::with_buffer(buffer, (self.width as u32, self.height as u32))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let (x_min, x_max) = x_range(set);

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.caption, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, Y_WINDOW.0..Y_WINDOW.1)?;

        chart
            .configure_mesh()
            .x_desc(&self.x_desc)
            .y_desc(&self.y_desc)
            .y_labels(Y_TICKS)
            .y_label_formatter(&|v| format!("{v:.0}"))
            .draw()?;

        for (i, (series, label)) in set
            .iter()
            .zip(labels)
            .enumerate()
        {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(
                    series
                        .points()
                        .map(|(x, y)| (x as f64, y)),
                    color.stroke_width(2),
                ))?
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}

impl Default for Chart {
    fn default() -> Self {
        Self::new()
    }
}

// Global x extent padded by 5% on each side. A degenerate extent is padded
// to a unit-wide window so a single abscissa still renders.
fn x_range(set: &SeriesSet) -> (f64, f64) {
    if set.is_empty() {
        return (0.0, 1.0);
    }
    let mut x_min = set.xmin() as f64;
    let mut x_max = set.xmax() as f64;

    let span = x_max - x_min;
    if span.abs() < f64::EPSILON {
        x_min -= 0.5;
        x_max += 0.5;
    } else {
        let margin = span * 0.05;
        x_min -= margin;
        x_max += margin;
    }
    (x_min, x_max)
}

/// Hands the rendered buffer to a window and blocks until the user closes
/// it.
pub fn show(title: &str, buffer: Vec<u8>, width: usize, height: usize) -> ! {
    let title = title.to_string();
    run_context(move || -> Result<(), Box<dyn std::error::Error>> {
        let window = create_window(title.as_str(), Default::default())?;

        window.set_image(
            "chart",
            ImageView::new(ImageInfo::rgb8(width as u32, height as u32), &buffer),
        )?;

        window.wait_until_destroyed()?;

        Ok(())
    })
}

/// Encodes the rendered buffer as a PNG at `path`.
pub fn save_png(
    path: impl AsRef<Path>,
    buffer: &[u8],
    width: usize,
    height: usize,
) -> Result<(), RenderErrors> {
    let path = path.as_ref();
    image::save_buffer(
        path,
        buffer,
        width as u32,
        height as u32,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|source| RenderErrors::Export {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use samples::Series;

    fn four_series() -> SeriesSet {
        let mut set = SeriesSet::new();
        for _ in 0..4 {
            set.insert(Series::new(vec![1, 2], vec![2.5, 3.75]));
        }
        set
    }

    #[test]
    fn test_render_label_mismatch() {
        let chart = Chart::new().with_size(320, 240);
        let result = chart.render(&four_series(), &["only", "three", "labels"]);
        assert!(matches!(
            result,
            Err(RenderErrors::LabelCount { series: 4, labels: 3 })
        ));
    }

    #[test]
    fn test_render_empty_series() {
        let mut set = four_series();
        set.insert(Series::new(Vec::new(), Vec::new()));
        let chart = Chart::new().with_size(320, 240);
        let result = chart.render(&set, &["a", "b", "c", "d", "empty"]);
        match result {
            Err(RenderErrors::EmptySeries(label)) => assert_eq!(label, "empty"),
            other => panic!("expected empty series error, got {other:?}"),
        }
    }

    #[test]
    fn test_render_four_series() {
        let chart = Chart::new()
            .with_size(320, 240)
            .with_caption("test");
        let buffer = chart
            .render(
                &four_series(),
                &["LongLongMap", "HashMap", "Hashtable", "TreeMap"],
            )
            .unwrap();

        assert_eq!(buffer.len(), 320 * 240 * 3);
        // white background plus at least some drawn pixels
        assert!(buffer.iter().any(|&b| b == 255));
        assert!(buffer.iter().any(|&b| b != 255));
    }

    #[test]
    fn test_render_single_abscissa() {
        let mut set = SeriesSet::new();
        set.insert(Series::new(vec![5], vec![1.0]));
        let chart = Chart::new().with_size(320, 240);
        assert!(chart.render(&set, &["point"]).is_ok());
    }

    #[test]
    fn test_x_range_padding() {
        let mut set = SeriesSet::new();
        set.insert(Series::new(vec![0, 100], vec![1.0, 2.0]));
        let (x_min, x_max) = x_range(&set);
        assert!(x_min < 0.0);
        assert!(x_max > 100.0);
    }
}
