//! Chart-ready data for an external renderer.
//!
//! Values are taken from the enriched series as-is; the only arithmetic here
//! is scaling ratios to percent and bucketing daily returns for the
//! distribution chart.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzer::{EnrichedRow, EnrichedSeries};
use crate::analyzer::price_analysis::MA_WINDOWS;
use crate::model::{DisplayOptions, Ticker};

/// Bucket count of the daily-return distribution.
pub const HISTOGRAM_BINS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub name: String,
    pub points: Vec<LinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBar {
    pub date: NaiveDate,
    pub volume: u64,
    /// Close below open; drawn in the "down" colour.
    pub falling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    Price {
        title: String,
        candles: Vec<Candle>,
        overlays: Vec<Overlay>,
    },
    Volume {
        bars: Vec<VolumeBar>,
    },
    Returns {
        cumulative_pct: Vec<LinePoint>,
        distribution_pct: Vec<HistogramBin>,
    },
    Volatility {
        title: String,
        points_pct: Vec<LinePoint>,
    },
}

fn to_pct(value: Option<f64>) -> Option<f64> {
    value.map(|v| v * 100.0)
}

/// Builds the panels selected by `display`. The price panel is always there.
pub fn build_panels(ticker: &Ticker, series: &EnrichedSeries, display: DisplayOptions) -> Vec<Panel> {
    let rows = series.rows();
    let mut panels = Vec::new();

    let candles = rows
        .iter()
        .map(|r| Candle {
            date: r.bar.date,
            open: r.bar.open,
            high: r.bar.high,
            low: r.bar.low,
            close: r.bar.close,
        })
        .collect();
    let overlays = if display.moving_averages {
        let columns: [fn(&EnrichedRow) -> Option<f64>; 3] = [
            |r: &EnrichedRow| r.ma_20,
            |r: &EnrichedRow| r.ma_50,
            |r: &EnrichedRow| r.ma_200,
        ];
        MA_WINDOWS
            .iter()
            .zip(columns)
            .map(|(window, column)| Overlay {
                name: format!("{}-day MA", window),
                points: rows
                    .iter()
                    .map(|r| LinePoint {
                        date: r.bar.date,
                        value: column(r),
                    })
                    .collect(),
            })
            .collect()
    } else {
        Vec::new()
    };
    panels.push(Panel::Price {
        title: format!("{} Stock Price", ticker),
        candles,
        overlays,
    });

    if display.volume {
        panels.push(Panel::Volume {
            bars: rows
                .iter()
                .map(|r| VolumeBar {
                    date: r.bar.date,
                    volume: r.bar.volume,
                    falling: r.bar.close < r.bar.open,
                })
                .collect(),
        });
    }

    if display.returns {
        let daily_pct: Vec<f64> = rows
            .iter()
            .filter_map(|r| to_pct(r.daily_return))
            .collect();
        panels.push(Panel::Returns {
            cumulative_pct: rows
                .iter()
                .map(|r| LinePoint {
                    date: r.bar.date,
                    value: to_pct(r.cumulative_return),
                })
                .collect(),
            distribution_pct: histogram(&daily_pct, HISTOGRAM_BINS),
        });
        panels.push(Panel::Volatility {
            title: format!("{} Rolling Volatility (20-day)", ticker),
            points_pct: rows
                .iter()
                .map(|r| LinePoint {
                    date: r.bar.date,
                    value: to_pct(r.volatility),
                })
                .collect(),
        });
    }

    panels
}

/// Equal-width histogram over the finite values. A degenerate range
/// collapses into one bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in finite {
        let index = (((v - min) / width) as usize).min(bins - 1);
        out[index].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::price_analysis::enrich;
    use crate::model::Bar;
    use chrono::Duration;

    fn series(n: usize) -> EnrichedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let close = 50.0 + (i % 5) as f64;
                Bar {
                    date: start + Duration::days(i as i64),
                    open: 52.0,
                    high: 60.0,
                    low: 45.0,
                    close,
                    volume: 500 + i as u64,
                }
            })
            .collect();
        enrich(&bars).unwrap()
    }

    fn ticker() -> Ticker {
        Ticker::parse("abc").unwrap()
    }

    #[test]
    fn test_all_panels_when_everything_enabled() {
        let panels = build_panels(&ticker(), &series(30), DisplayOptions::default());
        assert_eq!(panels.len(), 4);
        let Panel::Price { title, candles, overlays } = &panels[0] else {
            panic!("price panel first");
        };
        assert_eq!(title, "ABC Stock Price");
        assert_eq!(candles.len(), 30);
        assert_eq!(overlays.len(), 3);
        assert_eq!(overlays[0].name, "20-day MA");
        assert!(overlays[0].points[19].value.is_some());
        assert!(overlays[2].points.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_toggles_remove_panels() {
        let display = DisplayOptions {
            moving_averages: false,
            volume: false,
            returns: false,
        };
        let panels = build_panels(&ticker(), &series(10), display);
        assert_eq!(panels.len(), 1);
        assert!(matches!(&panels[0], Panel::Price { overlays, .. } if overlays.is_empty()));
    }

    #[test]
    fn test_volume_bars_flag_falling_days() {
        let display = DisplayOptions {
            returns: false,
            ..Default::default()
        };
        let panels = build_panels(&ticker(), &series(5), display);
        let Panel::Volume { bars } = &panels[1] else {
            panic!("volume panel second");
        };
        // open is 52: closes 50 and 51 fall, 52 does not.
        let falling: Vec<bool> = bars.iter().map(|b| b.falling).collect();
        assert_eq!(falling, vec![true, true, false, false, false]);
    }

    #[test]
    fn test_returns_panel_in_percent() {
        let s = series(3);
        let panels = build_panels(&ticker(), &s, DisplayOptions::default());
        let Panel::Returns { cumulative_pct, distribution_pct } = &panels[2] else {
            panic!("returns panel third");
        };
        assert_eq!(cumulative_pct[0].value, None);
        let expected = s.rows()[2].cumulative_return.unwrap() * 100.0;
        assert_eq!(cumulative_pct[2].value, Some(expected));
        let total: usize = distribution_pct.iter().map(|b| b.count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_histogram_counts_every_finite_value() {
        let values = [-2.0, -1.0, 0.0, 1.0, 2.0, f64::NAN, f64::INFINITY];
        let bins = histogram(&values, 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[0].lower, -2.0);
        assert_eq!(bins[3].upper, 2.0);
        assert_eq!(bins[3].count, 2);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let bins = histogram(&[0.0, 0.0, 0.0], HISTOGRAM_BINS);
        assert_eq!(
            bins,
            vec![HistogramBin {
                lower: 0.0,
                upper: 0.0,
                count: 3
            }]
        );
        assert!(histogram(&[], HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn test_panels_serialize_with_kind_tag() {
        let panels = build_panels(&ticker(), &series(3), DisplayOptions::default());
        let json = serde_json::to_value(&panels).unwrap();
        assert_eq!(json[0]["kind"], "price");
        assert_eq!(json[1]["kind"], "volume");
        assert_eq!(json[3]["kind"], "volatility");
    }
}
