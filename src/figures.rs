//! The paper's figures: which results feed each one and how it is drawn.

use crate::aggregate::{aggregate, AggregatedSeries, Entry};
use crate::chart::{
    Annotation, AxisSpec, ChartSpec, LegendPolicy, LegendPosition, LegendSpec, LineStyle, Marker,
    PanelSpec, SeriesStyle, TAB10,
};
use crate::dataset::{
    ExperimentKind, Metric, MEMCACHED, ROCKSDB, SCHBENCH, SYNTHETIC_BE, SYNTHETIC_LC,
};
use crate::error::{PlotError, Result};
use crate::series::SeriesCollection;
use clap::ValueEnum;
use log::info;
use std::path::Path;

/// Figures this tool can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FigureKind {
    /// Memcached 99.9% latency vs throughput
    Memcached,
    /// RocksDB server 99.9% slowdown vs throughput
    Rocksdb,
    /// schbench wakeup latency vs worker threads, kernel and user-space schedulers
    Schbench,
    /// schbench wakeup latency for Skyloft scheduling policies
    SchbenchPolicies,
    /// Synthetic workload, latency-critical only
    SyntheticA,
    /// Synthetic workload co-located with batch, latency side
    SyntheticB,
    /// Synthetic workload co-located with batch, batch CPU share
    SyntheticC,
}

/// Where one panel's series come from
#[derive(Debug, Clone)]
pub struct PanelSource {
    pub kind: ExperimentKind,
    pub metric: &'static str,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub name: &'static str,
    /// Result directory, relative to the results root
    pub experiment: &'static str,
    pub default_output: &'static str,
    pub sources: Vec<PanelSource>,
    pub chart: ChartSpec,
}

impl Figure {
    /// Aggregate every metric of each panel's source from `dir`
    pub fn load(&self, dir: &Path) -> Result<Vec<AggregatedSeries>> {
        self.sources
            .iter()
            .map(|source| -> Result<AggregatedSeries> {
                let all = aggregate(dir, &source.kind, &source.entries)?;
                let systems = all.get(source.metric).map_or(0, SeriesCollection::len);
                info!(
                    "{}: {} of {} systems from {}",
                    self.name,
                    source.metric,
                    systems,
                    dir.display()
                );
                Ok(all)
            })
            .collect()
    }

    /// The plotted collection of each panel, picked from loaded data
    pub fn panels<'a>(&self, data: &'a [AggregatedSeries]) -> Result<Vec<&'a SeriesCollection>> {
        self.sources
            .iter()
            .zip(data)
            .map(|(source, all)| {
                all.get(source.metric).ok_or_else(|| PlotError::UnknownLabel {
                    label: format!("{}/{}", source.kind.name, source.metric),
                })
            })
            .collect()
    }
}

impl FigureKind {
    pub fn figure(self) -> Figure {
        match self {
            FigureKind::Memcached => memcached(),
            FigureKind::Rocksdb => rocksdb(),
            FigureKind::Schbench => schbench(),
            FigureKind::SchbenchPolicies => schbench_policies(),
            FigureKind::SyntheticA => synthetic_a(),
            FigureKind::SyntheticB => synthetic_b(),
            FigureKind::SyntheticC => synthetic_c(),
        }
    }
}

const WIDE: (u32, u32) = (900, 375);
const NARROW: (u32, u32) = (600, 375);

fn axis(metric: &Metric) -> AxisSpec {
    let (min, max) = metric.valid_range.unwrap_or((0.0, 1.0));
    AxisSpec::linear(min, max)
}

fn legend(policy: LegendPolicy, position: LegendPosition) -> LegendSpec {
    LegendSpec { policy, position }
}

/// Style with a `tab10` palette index
fn sys(
    key: &'static str,
    label: &'static str,
    marker: Marker,
    line: LineStyle,
    color: usize,
) -> SeriesStyle {
    SeriesStyle::new(key, label, marker, line, TAB10[color])
}

fn single(kind: ExperimentKind, metric: &'static str, names: &[&'static str]) -> PanelSource {
    PanelSource {
        kind,
        metric,
        entries: names.iter().map(|&n| Entry::same(n)).collect(),
    }
}

fn memcached() -> Figure {
    let metric = &MEMCACHED.y[0];
    let panel = PanelSpec::new(
        axis(&MEMCACHED.x)
            .ticks([0.0, 0.5, 1.0, 1.5, 2.0, 2.5])
            .minor(0.1),
        axis(metric)
            .ticks((0..=5).map(|i| i as f64 * 100.0))
            .minor(50.0)
            .grid(),
        vec![
            sys("shenango", "Shenango", Marker::Pixel, LineStyle::Dotted, 0).z_order(1),
            sys("skyloft", "Skyloft", Marker::Point, LineStyle::Solid, 2).z_order(4),
        ],
    );
    Figure {
        name: "memcached",
        experiment: "memcached/USR",
        default_output: "memcached.svg",
        sources: vec![single(MEMCACHED, metric.name, &["shenango", "skyloft"])],
        chart: ChartSpec {
            size: WIDE,
            x_desc: "Throughput (MRPS)",
            y_desc: "99.9% Latency (µs)",
            panels: vec![panel],
            legend: legend(LegendPolicy::Deduplicated, LegendPosition::UpperLeft),
        },
    }
}

fn rocksdb() -> Figure {
    let metric = &ROCKSDB.y[0];
    let panel = PanelSpec::new(
        axis(&ROCKSDB.x).ticks([0.0, 10.0, 20.0, 30.0, 40.0]).minor(2.5),
        axis(metric).ticks([0.0, 50.0, 100.0, 150.0, 200.0]).minor(25.0).grid(),
        vec![
            sys("shenango", "Shenango", Marker::Pixel, LineStyle::Dotted, 0),
            sys("skyloft_nopre", "Skyloft (no preemption)", Marker::Point, LineStyle::Solid, 2),
            sys("skyloft_20us", "Skyloft (20µs)", Marker::Plus, LineStyle::Solid, 4),
            sys("skyloft_5us", "Skyloft (5µs)", Marker::Cross, LineStyle::Solid, 1),
            sys("skyloft_5us_utimer", "Skyloft (5µs utimer)", Marker::Circle, LineStyle::Solid, 3),
        ],
    )
    // Slowdown SLO
    .annotate(Annotation::HorizontalLine { y: 50.0, dashed: true });
    Figure {
        name: "rocksdb",
        experiment: "rocksdb/50-get-50-scan",
        default_output: "rocksdb_server.svg",
        sources: vec![single(
            ROCKSDB,
            metric.name,
            &[
                "shenango",
                "skyloft_nopre",
                "skyloft_20us",
                "skyloft_5us",
                "skyloft_5us_utimer",
            ],
        )],
        chart: ChartSpec {
            size: WIDE,
            x_desc: "Throughput (kRPS)",
            y_desc: "99.9% Slowdown",
            panels: vec![panel],
            legend: legend(LegendPolicy::Deduplicated, LegendPosition::UpperLeft),
        },
    }
}

const LATENCY_TICKS: [(f64, &str); 5] = [
    (1.0, "1µs"),
    (10.0, "10µs"),
    (100.0, "100µs"),
    (1000.0, "1ms"),
    (10000.0, "10ms"),
];

fn thread_axis() -> AxisSpec {
    axis(&SCHBENCH.x).ticks((0..7).map(|i| 16.0 * i as f64)).minor(8.0)
}

fn schbench() -> Figure {
    let (min, max) = SCHBENCH.y[0].valid_range.unwrap_or((1.0, 20000.0));
    let styles = vec![
        sys("linux_rr", "Linux-RR", Marker::Point, LineStyle::Dotted, 0),
        sys("linux_cfs", "Linux-CFS", Marker::Plus, LineStyle::Dashed, 4),
        sys("linux_cfs_opt", "Linux-CFS-opt", Marker::Star, LineStyle::Dashed, 2),
        sys("linux_eevdf", "Linux-EEVDF", Marker::Star, LineStyle::Solid, 6),
        sys("skyloft_eevdf", "Skyloft-EEVDF", Marker::Cross, LineStyle::Dashed, 5),
        sys("skyloft_rr50us", "Skyloft-RR", Marker::Cross, LineStyle::Solid, 1),
        sys("skyloft_cfs50us", "Skyloft-CFS", Marker::Circle, LineStyle::Solid, 3),
    ];
    let names: Vec<&'static str> = styles.iter().map(|s| s.key).collect();
    let panel = PanelSpec::new(
        thread_axis(),
        AxisSpec::log10(min, max).labeled_ticks(&LATENCY_TICKS).grid(),
        styles,
    );
    Figure {
        name: "schbench",
        experiment: "schbench",
        default_output: "schbench.svg",
        sources: vec![single(SCHBENCH, "wakeup_p99", &names)],
        chart: ChartSpec {
            size: WIDE,
            x_desc: "Number of worker threads",
            y_desc: "99% wakeup latency",
            panels: vec![panel],
            legend: legend(LegendPolicy::Deduplicated, LegendPosition::UpperLeft),
        },
    }
}

fn schbench_policies() -> Figure {
    let styles = vec![
        sys("skyloft_fifo", "Skyloft-FIFO", Marker::Point, LineStyle::Dotted, 0),
        sys("skyloft_rr1ms", "Skyloft-RR (1ms)", Marker::Plus, LineStyle::Dashed, 4),
        sys("skyloft_rr200us", "Skyloft-RR (200µs)", Marker::Star, LineStyle::Solid, 2),
        sys("skyloft_rr50us", "Skyloft-RR (50µs)", Marker::Cross, LineStyle::Solid, 1),
    ];
    let names: Vec<&'static str> = styles.iter().map(|s| s.key).collect();
    let panel = PanelSpec::new(
        thread_axis(),
        AxisSpec::log10(1.0, 10000.0).labeled_ticks(&LATENCY_TICKS).grid(),
        styles,
    );
    Figure {
        name: "schbench-policies",
        experiment: "schbench",
        default_output: "schbench2.svg",
        sources: vec![single(SCHBENCH, "wakeup_p99", &names)],
        chart: ChartSpec {
            size: WIDE,
            x_desc: "Number of worker threads",
            y_desc: "99% wakeup latency",
            panels: vec![panel],
            legend: legend(LegendPolicy::Deduplicated, LegendPosition::LowerRight),
        },
    }
}

const SYNTHETIC_SYSTEMS: [&str; 4] = ["cfs", "ghost-30us", "shinjuku-30us", "skyloft-30us"];

fn synthetic_styles() -> Vec<SeriesStyle> {
    vec![
        sys("cfs", "CFS", Marker::Point, LineStyle::Dotted, 0),
        sys("ghost-30us", "ghOSt (30µs)", Marker::Plus, LineStyle::Solid, 4),
        sys("shinjuku-30us", "Shinjuku (30µs)", Marker::Star, LineStyle::Solid, 2),
        sys("skyloft-30us", "Skyloft (30µs)", Marker::Cross, LineStyle::Solid, 1),
    ]
}

fn synthetic_latency_panel() -> PanelSpec {
    PanelSpec::new(
        axis(&SYNTHETIC_LC.x).ticks([0.0, 100.0, 200.0, 300.0]).minor(20.0),
        axis(&SYNTHETIC_LC.y[0])
            .ticks((0..=5).map(|i| i as f64 * 200.0))
            .minor(100.0)
            .grid(),
        synthetic_styles(),
    )
}

/// Co-located run: `<system>-lc` and `<system>-be` files side by side
const COLOCATED_LC: [Entry; 4] = [
    Entry::new("cfs-lc", "cfs"),
    Entry::new("ghost-30us-lc", "ghost-30us"),
    Entry::new("shinjuku-30us-lc", "shinjuku-30us"),
    Entry::new("skyloft-30us-lc", "skyloft-30us"),
];
const COLOCATED_BE: [Entry; 4] = [
    Entry::new("cfs-be", "cfs"),
    Entry::new("ghost-30us-be", "ghost-30us"),
    Entry::new("shinjuku-30us-be", "shinjuku-30us"),
    Entry::new("skyloft-30us-be", "skyloft-30us"),
];

fn colocated(kind: ExperimentKind, entries: &[Entry]) -> PanelSource {
    PanelSource {
        kind,
        metric: kind.y[0].name,
        entries: entries.to_vec(),
    }
}

fn synthetic_a() -> Figure {
    Figure {
        name: "synthetic-a",
        experiment: "synthetic/99.5-4-0.5-10000",
        default_output: "synthetic-a.svg",
        sources: vec![single(SYNTHETIC_LC, SYNTHETIC_LC.y[0].name, &SYNTHETIC_SYSTEMS)],
        chart: ChartSpec {
            size: NARROW,
            x_desc: "Throughput (kRPS)",
            y_desc: "99% Latency (µs)",
            panels: vec![synthetic_latency_panel()],
            legend: legend(LegendPolicy::Deduplicated, LegendPosition::UpperLeft),
        },
    }
}

fn synthetic_b() -> Figure {
    Figure {
        name: "synthetic-b",
        experiment: "synthetic/99.5-4-0.5-10000-lcbe",
        default_output: "synthetic-b.svg",
        sources: vec![colocated(SYNTHETIC_LC, &COLOCATED_LC)],
        chart: ChartSpec {
            size: NARROW,
            x_desc: "Throughput (kRPS)",
            y_desc: "99% Latency (µs)",
            panels: vec![synthetic_latency_panel()],
            legend: legend(LegendPolicy::Hidden, LegendPosition::UpperLeft),
        },
    }
}

fn synthetic_c() -> Figure {
    let panel = PanelSpec::new(
        axis(&SYNTHETIC_BE.x).ticks([0.0, 100.0, 200.0, 300.0]).minor(20.0),
        axis(&SYNTHETIC_BE.y[0]).ticks([0.0, 0.2, 0.4, 0.6, 0.8, 1.0]).grid(),
        synthetic_styles(),
    )
    .annotate(Annotation::Text {
        at: (100.0, 0.2),
        text: "➊",
        size: 14.0,
    })
    .annotate(Annotation::Arrow {
        from: (110.0, 0.16),
        to: (130.0, 0.04),
    });
    Figure {
        name: "synthetic-c",
        experiment: "synthetic/99.5-4-0.5-10000-lcbe",
        default_output: "synthetic-c.svg",
        sources: vec![colocated(SYNTHETIC_BE, &COLOCATED_BE)],
        chart: ChartSpec {
            size: NARROW,
            x_desc: "Throughput (kRPS)",
            y_desc: "Batch CPU Share",
            panels: vec![panel],
            legend: legend(LegendPolicy::Hidden, LegendPosition::UpperLeft),
        },
    }
}
