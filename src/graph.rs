#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use crate::dashboard::{AggregateRow, DashboardView};
use crate::error::ChartError;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;

/// Plotly's default qualitative palette, cycled over the series
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x63, 0x6E, 0xFA),
    RGBColor(0xEF, 0x55, 0x3B),
    RGBColor(0x00, 0xCC, 0x96),
    RGBColor(0xAB, 0x63, 0xFA),
    RGBColor(0xFF, 0xA1, 0x5A),
    RGBColor(0x19, 0xD3, 0xF3),
    RGBColor(0xFF, 0x66, 0x92),
    RGBColor(0xB6, 0xE8, 0x80),
    RGBColor(0xFF, 0x97, 0xFF),
    RGBColor(0xFE, 0xCB, 0x52),
];

/// Colour of the series at `index`
pub fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// CSS hex form of a series colour, for the page legend
pub fn series_color_hex(index: usize) -> String {
    let RGBColor(r, g, b) = series_color(index);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the category axis
    pub x_label: String,

    /// Label for the count axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,

    /// Segments shorter than this many pixels get no count label
    pub min_label_px: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Quantidade de Servidores por Cargo em cada Lotação".to_string(),
            x_label: "Lotação".to_string(),
            y_label: "Nº de Servidores".to_string(),
            width: 1100,
            height: 650,
            min_label_px: 8,
        }
    }
}

/// One stacked piece of a bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Index into `ChartEncoding::categories`
    pub category: usize,
    /// Index into `ChartEncoding::series`
    pub series: usize,
    /// Height of the stack below this segment
    pub base: usize,
    pub count: usize,
    pub hover: String,
}

/// Plot model of the stacked bar chart
///
/// Categories are units ordered by descending total; series are titles in
/// legend order. Within a bar, segments stack in series order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartEncoding {
    pub categories: Vec<String>,
    pub series: Vec<String>,
    pub segments: Vec<Segment>,
}

impl ChartEncoding {
    pub fn from_view(view: &DashboardView) -> Self {
        let categories = view.category_order.clone();
        let series = view.series_order.clone();
        let mut heights = vec![0usize; categories.len()];
        let mut segments = Vec::with_capacity(view.aggregates.len());

        for (s, title) in series.iter().enumerate() {
            for row in view.aggregates.iter().filter(|row| &row.title == title) {
                let Some(c) = categories.iter().position(|unit| unit == &row.unit) else {
                    continue;
                };
                segments.push(Segment {
                    category: c,
                    series: s,
                    base: heights[c],
                    count: row.count,
                    hover: hover_text(row),
                });
                heights[c] += row.count;
            }
        }

        ChartEncoding {
            categories,
            series,
            segments,
        }
    }

    /// Height of the tallest bar
    pub fn max_total(&self) -> usize {
        self.segments
            .iter()
            .map(|seg| seg.base + seg.count)
            .max()
            .unwrap_or(0)
    }
}

/// Tooltip of one group: title first, then unit, count and members
pub fn hover_text(row: &AggregateRow) -> String {
    format!(
        "{}\nLotação={}\nNº de Servidores={}\nServidores={}",
        row.title, row.unit, row.count, row.members
    )
}

/// Renders the chart as an SVG document
///
/// # Errors
/// * `ChartError::Empty` if there is nothing to plot
/// * `ChartError::Drawing` if plotters fails
pub fn render_svg(encoding: &ChartEncoding, options: &ChartOptions) -> Result<String, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        draw_chart(&root, encoding, options)?;
        root.present()?;
    }
    Ok(svg)
}

/// Renders the chart as PNG bytes
///
/// The bitmap is drawn into memory and encoded with the `image` crate, so no
/// temporary file is involved.
pub fn render_png(encoding: &ChartEncoding, options: &ChartOptions) -> Result<Vec<u8>, ChartError> {
    let (width, height) = (options.width, options.height);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, encoding, options)?;
        root.present()?;
    }

    let bitmap = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ChartError::Drawing("bitmap buffer size mismatch".to_string()))?;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(bitmap)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)?;
    Ok(png)
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    encoding: &ChartEncoding,
    options: &ChartOptions,
) -> Result<(), ChartError> {
    if encoding.categories.is_empty() || encoding.segments.is_empty() {
        return Err(ChartError::Empty);
    }
    root.fill(&WHITE)?;

    let categories: &[String] = &encoding.categories;
    // headroom above the tallest bar for its label
    let y_max = (encoding.max_total() as f64 * 1.1).max(1.0);
    // counts are whole numbers; at most one tick per unit keeps every tick on an integer
    let y_ticks = (y_max.floor() as usize + 1).min(10);

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(categories.into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(unit) => unit.to_string(),
            _ => String::new(),
        })
        .y_labels(y_ticks)
        .y_label_formatter(&|y| {
            if y.fract() == 0.0 {
                format!("{:.0}", y)
            } else {
                String::new()
            }
        })
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .draw()?;

    for (s, title) in encoding.series.iter().enumerate() {
        let color = series_color(s);
        chart
            .draw_series(
                encoding
                    .segments
                    .iter()
                    .filter(|seg| seg.series == s)
                    .map(|seg| {
                        let right = categories
                            .get(seg.category + 1)
                            .map(SegmentValue::Exact)
                            .unwrap_or(SegmentValue::Last);
                        let mut bar = Rectangle::new(
                            [
                                (SegmentValue::Exact(&categories[seg.category]), seg.base as f64),
                                (right, (seg.base + seg.count) as f64),
                            ],
                            color.filled(),
                        );
                        bar.set_margin(0, 0, 12, 12);
                        bar
                    }),
            )?
            .label(title.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    let plot_height = chart.plotting_area().dim_in_pixel().1 as f64;
    let label_style = ("sans-serif", 12)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    // drawn element-by-element: `draw_series`' higher-ranked bound on `Text` would require
    // `'static` coordinates, which the borrowed category labels cannot satisfy
    for label in encoding
        .segments
        .iter()
        .filter(|seg| seg.count as f64 / y_max * plot_height >= options.min_label_px as f64)
        .map(|seg| {
            Text::new(
                seg.count.to_string(),
                (
                    SegmentValue::CenterOf(&categories[seg.category]),
                    seg.base as f64 + seg.count as f64 / 2.0,
                ),
                label_style.clone(),
            )
        })
    {
        chart.plotting_area().draw(&label)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::render;
    use crate::record::{Dataset, Record};
    use crate::selection::Selection;

    fn view() -> DashboardView {
        let dataset = Dataset::from_records(vec![
            Record::new("A", "X", "Alice"),
            Record::new("A", "X", "Bob"),
            Record::new("B", "Y", "Carl"),
            Record::new("B", "X", "Dora"),
            Record::new("A", "Y", "Eva"),
            Record::new("B", "Y", "Fred"),
            Record::new("B", "Y", "Gus"),
        ]);
        render(&dataset, &Selection::new(["A", "B"], Vec::<String>::new()), 5)
            .view()
            .cloned()
            .expect("rendered")
    }

    #[test]
    fn bars_follow_category_order() {
        let encoding = ChartEncoding::from_view(&view());
        // B has 4 people, A has 3
        assert_eq!(encoding.categories, vec!["B", "A"]);
        assert_eq!(encoding.series, vec!["X", "Y"]);
        assert_eq!(encoding.max_total(), 4);
    }

    #[test]
    fn segments_stack_in_series_order() {
        let encoding = ChartEncoding::from_view(&view());
        let b: Vec<(usize, usize, usize)> = encoding
            .segments
            .iter()
            .filter(|seg| seg.category == 0)
            .map(|seg| (seg.series, seg.base, seg.count))
            .collect();
        assert_eq!(b, vec![(0, 0, 1), (1, 1, 3)]);

        let total: usize = encoding.segments.iter().map(|seg| seg.count).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn hover_lists_title_unit_count_and_members() {
        let row = AggregateRow {
            unit: "A".to_string(),
            title: "X".to_string(),
            count: 2,
            members: "Alice, Bob".to_string(),
        };
        let hover = hover_text(&row);
        assert!(hover.starts_with("X\n"));
        assert!(hover.contains("Lotação=A"));
        assert!(hover.contains("Nº de Servidores=2"));
        assert!(hover.contains("Servidores=Alice, Bob"));
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(series_color_hex(0), "#636EFA");
        assert_eq!(series_color_hex(10), series_color_hex(0));
    }

    #[test]
    fn empty_encoding_is_rejected() {
        let encoding = ChartEncoding {
            categories: Vec::new(),
            series: Vec::new(),
            segments: Vec::new(),
        };
        assert!(matches!(
            render_svg(&encoding, &ChartOptions::default()),
            Err(ChartError::Empty)
        ));
    }

    /// Builds the encoding for groups of (unit, title, head count)
    fn encoding_of(groups: &[(&str, &str, usize)]) -> ChartEncoding {
        let mut records = Vec::new();
        for (unit, title, count) in groups {
            for i in 0..*count {
                records.push(Record::new(unit, title, &format!("P{}", i)));
            }
        }
        let units: Vec<&str> = groups.iter().map(|group| group.0).collect();
        let state = render(
            &Dataset::from_records(records),
            &Selection::new(units, Vec::<String>::new()),
            5,
        );
        ChartEncoding::from_view(state.view().expect("rendered"))
    }

    struct SvgText {
        x: f64,
        y: f64,
        content: String,
    }

    fn svg_texts(svg: &str) -> Vec<SvgText> {
        svg.split("<text")
            .skip(1)
            .filter_map(|chunk| {
                let attr = |name: &str| -> Option<f64> {
                    let key = format!(" {}=\"", name);
                    let start = chunk.find(&key)? + key.len();
                    let end = chunk[start..].find('"')? + start;
                    chunk[start..end].parse().ok()
                };
                let open_end = chunk.find('>')?;
                let close = chunk.find("</text>")?;
                let content = chunk[open_end + 1..close].trim();
                // blank tick labels are still emitted as empty elements
                if content.is_empty() {
                    return None;
                }
                Some(SvgText {
                    x: attr("x")?,
                    y: attr("y")?,
                    content: content.to_string(),
                })
            })
            .collect()
    }

    fn text_named<'a>(texts: &'a [SvgText], content: &str) -> &'a SvgText {
        texts
            .iter()
            .find(|text| text.content == content)
            .unwrap_or_else(|| panic!("no text '{}' in chart", content))
    }

    /// Count labels drawn inside the bar of `unit`, bottom to top
    fn segment_labels(texts: &[SvgText], unit: &str) -> Vec<String> {
        let axis_label = text_named(texts, unit);
        let mut labels: Vec<&SvgText> = texts
            .iter()
            .filter(|text| (text.x - axis_label.x).abs() <= 2.0)
            .filter(|text| (text.y - axis_label.y).abs() > 2.0)
            .filter(|text| text.content.parse::<usize>().is_ok())
            .collect();
        labels.sort_by(|a, b| b.y.total_cmp(&a.y));
        labels.iter().map(|text| text.content.clone()).collect()
    }

    #[test]
    fn x_axis_has_one_slot_per_unit() {
        let encoding = encoding_of(&[("SEDE", "ANALISTA", 2), ("CAMPINAS", "TECNICO", 1)]);
        let svg = render_svg(&encoding, &ChartOptions::default()).unwrap();
        let texts = svg_texts(&svg);

        let axis_y = text_named(&texts, "SEDE").y;
        let mut axis_labels: Vec<&str> = texts
            .iter()
            .filter(|text| (text.y - axis_y).abs() <= 2.0)
            .map(|text| text.content.as_str())
            .collect();
        axis_labels.sort();
        assert_eq!(axis_labels, vec!["CAMPINAS", "SEDE"]);

        // the first bar is left of the second, and the second reaches into the right half
        let sede = text_named(&texts, "SEDE").x;
        let campinas = text_named(&texts, "CAMPINAS").x;
        assert!(sede < campinas);
        assert!(campinas > ChartOptions::default().width as f64 / 2.0);
    }

    #[test]
    fn y_ticks_are_distinct_whole_numbers() {
        let encoding = encoding_of(&[("SEDE", "ANALISTA", 2)]);
        let svg = render_svg(&encoding, &ChartOptions::default()).unwrap();
        let texts = svg_texts(&svg);

        let zero = text_named(&texts, "0");
        let mut ticks: Vec<&SvgText> = texts
            .iter()
            .filter(|text| (text.x - zero.x).abs() <= 2.0)
            .collect();
        ticks.sort_by(|a, b| b.y.total_cmp(&a.y));
        let labels: Vec<&str> = ticks.iter().map(|text| text.content.as_str()).collect();
        assert_eq!(labels, vec!["0", "1", "2"]);
    }

    #[test]
    fn every_segment_is_labelled() {
        let encoding = encoding_of(&[
            ("SEDE", "ANALISTA", 4),
            ("SEDE", "TECNICO", 3),
            ("CAMPINAS", "ANALISTA", 5),
        ]);
        let svg = render_svg(&encoding, &ChartOptions::default()).unwrap();
        let texts = svg_texts(&svg);

        assert_eq!(segment_labels(&texts, "SEDE"), vec!["4", "3"]);
        assert_eq!(segment_labels(&texts, "CAMPINAS"), vec!["5"]);
    }

    #[test]
    fn short_segments_lose_their_label() {
        let encoding = encoding_of(&[("SEDE", "ANALISTA", 100), ("SEDE", "TECNICO", 1)]);
        let svg = render_svg(&encoding, &ChartOptions::default()).unwrap();
        let texts = svg_texts(&svg);

        assert_eq!(segment_labels(&texts, "SEDE"), vec!["100"]);
    }

    #[test]
    fn legend_lists_each_title_once() {
        let encoding = encoding_of(&[
            ("SEDE", "ANALISTA", 2),
            ("SEDE", "TECNICO", 1),
            ("CAMPINAS", "TECNICO", 2),
        ]);
        let svg = render_svg(&encoding, &ChartOptions::default()).unwrap();
        let texts = svg_texts(&svg);

        for title in ["ANALISTA", "TECNICO"] {
            let entries = texts.iter().filter(|text| text.content == title).count();
            assert_eq!(entries, 1, "legend entries for {}", title);
        }
    }

    #[test]
    fn png_output_is_encoded() {
        let encoding = encoding_of(&[("SEDE", "ANALISTA", 2)]);
        let png = render_png(&encoding, &ChartOptions::default()).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
