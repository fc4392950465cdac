//! Chart state: the one long-lived, mutable chart instance.
//!
//! `ChartStateManager` is Empty until the first successful run, then Live
//! forever. The first render constructs a [`PriceChart`]; every later render
//! rewrites its labels and layers in place, so the viewport the user zoomed
//! or panned to is kept.

use std::ops::Range;

use crate::domain::{
    AlignedChartSeries, GenerationCounter, LevelSet, RunGeneration, StandardDeviation,
};
use crate::orchestrator::RunOutput;

/// The seven data layers, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Price,
    Regression,
    MajorResistance,
    MajorSupport,
    MinorResistance,
    MinorSupport,
    MovingAverage,
}

impl LayerKind {
    pub const ALL: [LayerKind; 7] = [
        LayerKind::Price,
        LayerKind::Regression,
        LayerKind::MajorResistance,
        LayerKind::MajorSupport,
        LayerKind::MinorResistance,
        LayerKind::MinorSupport,
        LayerKind::MovingAverage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LayerKind::Price => "Closing price",
            LayerKind::Regression => "Linear regression",
            LayerKind::MajorResistance => "Major resistance",
            LayerKind::MajorSupport => "Major support",
            LayerKind::MinorResistance => "Minor resistance",
            LayerKind::MinorSupport => "Minor support",
            LayerKind::MovingAverage => "Moving average",
        }
    }

    /// Flat reference lines.
    pub fn is_level(self) -> bool {
        matches!(
            self,
            LayerKind::MajorResistance
                | LayerKind::MajorSupport
                | LayerKind::MinorResistance
                | LayerKind::MinorSupport
        )
    }

    fn level_value(self, levels: &LevelSet) -> Option<f64> {
        match self {
            LayerKind::MajorResistance => Some(levels.major_resistance),
            LayerKind::MajorSupport => Some(levels.major_support),
            LayerKind::MinorResistance => Some(levels.minor_resistance),
            LayerKind::MinorSupport => Some(levels.minor_support),
            _ => None,
        }
    }
}

/// One data layer: a value (or gap) per label.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    kind: LayerKind,
    values: Vec<Option<f64>>,
}

impl Layer {
    fn empty(kind: LayerKind) -> Self {
        Self {
            kind,
            values: Vec::new(),
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Rewrite the layer from `series`, reusing its allocation.
    fn fill(&mut self, series: &AlignedChartSeries) {
        self.values.clear();
        match self.kind {
            LayerKind::Price => self.values.extend(series.prices().map(Some)),
            LayerKind::Regression => self.values.extend(series.regression().map(Some)),
            LayerKind::MovingAverage => self.values.extend(series.moving_average()),
            level => {
                let value = level.level_value(series.levels());
                self.values.extend(std::iter::repeat(value).take(series.len()));
            }
        }
    }

    /// Runs of consecutive present values as `(index, value)` pairs.
    ///
    /// A gap ends the current run; nothing is ever interpolated across it.
    pub fn segments(&self) -> Vec<Vec<(usize, f64)>> {
        let mut out = Vec::new();
        let mut current = Vec::new();
        for (i, value) in self.values.iter().enumerate() {
            match value {
                Some(v) => current.push((i, *v)),
                None if !current.is_empty() => out.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

/// Visible x window over the labels. `width == None` shows everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    width: Option<usize>,
}

impl Viewport {
    const MIN_WIDTH: usize = 2;

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> Option<usize> {
        self.width
    }

    pub fn is_full(&self) -> bool {
        self.width.is_none()
    }

    pub fn zoom_in(&mut self, len: usize) {
        let current = self.width.unwrap_or(len);
        let next = (current / 2).max(Self::MIN_WIDTH);
        if next < len {
            // Keep the centre roughly in place.
            self.offset += (current - next) / 2;
            self.width = Some(next);
        }
        self.clamp(len);
    }

    pub fn zoom_out(&mut self, len: usize) {
        if let Some(width) = self.width {
            let next = width.saturating_mul(2);
            if next >= len {
                self.reset();
            } else {
                self.offset = self.offset.saturating_sub((next - width) / 2);
                self.width = Some(next);
            }
        }
        self.clamp(len);
    }

    pub fn pan_left(&mut self, len: usize) {
        self.offset = self.offset.saturating_sub(self.step());
        self.clamp(len);
    }

    pub fn pan_right(&mut self, len: usize) {
        self.offset = self.offset.saturating_add(self.step());
        self.clamp(len);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn step(&self) -> usize {
        self.width.map_or(0, |w| (w / 4).max(1))
    }

    /// Keep the window inside `0..len`. A window as wide as the data
    /// collapses back to the full view.
    pub fn clamp(&mut self, len: usize) {
        match self.width {
            None => self.offset = 0,
            Some(w) if w >= len => self.reset(),
            Some(w) => self.offset = self.offset.min(len - w),
        }
    }

    /// Index range currently visible for `len` labels.
    pub fn window(&self, len: usize) -> Range<usize> {
        match self.width {
            None => 0..len,
            Some(w) => {
                let start = self.offset.min(len);
                start..(start + w).min(len)
            }
        }
    }
}

/// The live chart instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChart {
    title: String,
    subtitle: String,
    labels: Vec<String>,
    layers: Vec<Layer>,
    viewport: Viewport,
    redraws: u64,
    generation: Option<RunGeneration>,
}

impl PriceChart {
    /// Build a fresh instance with all seven layers.
    pub fn construct(title: &str, series: &AlignedChartSeries, std_dev: StandardDeviation) -> Self {
        let mut chart = Self {
            title: String::new(),
            subtitle: String::new(),
            labels: Vec::with_capacity(series.len()),
            layers: LayerKind::ALL.iter().map(|&k| Layer::empty(k)).collect(),
            viewport: Viewport::default(),
            redraws: 0,
            generation: None,
        };
        chart.mutate(title, series, std_dev);
        chart
    }

    /// Replace labels and every layer in place, then request a redraw.
    /// The viewport is kept, clamped to the new label count.
    pub fn mutate(&mut self, title: &str, series: &AlignedChartSeries, std_dev: StandardDeviation) {
        self.title.clear();
        self.title.push_str(title);
        self.subtitle = format!("σ = {std_dev}");
        self.labels.clear();
        self.labels.extend(series.labels());
        for layer in &mut self.layers {
            layer.fill(series);
        }
        self.viewport.clamp(self.labels.len());
        self.redraws += 1;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Standard-deviation display value, e.g. `σ = 12.34`.
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Number of redraws requested since construction (1 after construct).
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Generation of the run currently drawn, if it came through `apply`.
    pub fn generation(&self) -> Option<RunGeneration> {
        self.generation
    }

    /// Min/max over every present value in `range`, for the y axis.
    pub fn y_bounds(&self, range: Range<usize>) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;
        for layer in &self.layers {
            let end = range.end.min(layer.values.len());
            let start = range.start.min(end);
            for v in layer.values[start..end].iter().flatten() {
                bounds = Some(match bounds {
                    None => (*v, *v),
                    Some((lo, hi)) => (lo.min(*v), hi.max(*v)),
                });
            }
        }
        bounds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Empty → Live: the instance was created.
    Constructed,
    /// Live → Live: the existing instance was rewritten in place.
    Updated,
    /// A newer run exists; the chart was not touched.
    Stale,
}

#[derive(Debug, Default)]
enum ChartState {
    #[default]
    Empty,
    Live(PriceChart),
}

/// Owns at most one chart instance and decides construct vs mutate.
#[derive(Debug, Default)]
pub struct ChartStateManager {
    state: ChartState,
    generations: Option<GenerationCounter>,
    highest_applied: Option<RunGeneration>,
    constructions: usize,
}

impl ChartStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat outputs as stale once a newer run has merely *started*,
    /// not just once a newer output has been applied.
    pub fn with_generations(generations: GenerationCounter) -> Self {
        Self {
            generations: Some(generations),
            ..Self::default()
        }
    }

    /// Draw `series` without any generation check.
    pub fn render(
        &mut self,
        title: &str,
        series: &AlignedChartSeries,
        std_dev: StandardDeviation,
    ) -> RenderOutcome {
        match &mut self.state {
            ChartState::Live(chart) => {
                chart.mutate(title, series, std_dev);
                RenderOutcome::Updated
            }
            ChartState::Empty => {
                self.state = ChartState::Live(PriceChart::construct(title, series, std_dev));
                self.constructions += 1;
                RenderOutcome::Constructed
            }
        }
    }

    /// Draw a run's output unless a newer generation owns the chart.
    pub fn apply(&mut self, output: &RunOutput) -> RenderOutcome {
        let generation = output.generation;
        if self.is_stale(generation) {
            tracing::warn!(%generation, "discarding stale run output");
            return RenderOutcome::Stale;
        }

        let snapshot = &output.snapshot;
        let range = snapshot.range();
        let title = format!(
            "{} {} - {}",
            snapshot.company(),
            range.start().format(crate::domain::DISPLAY_DATE_FORMAT),
            range.end().format(crate::domain::DISPLAY_DATE_FORMAT),
        );
        let outcome = self.render(&title, &output.series, output.std_dev);
        if let ChartState::Live(chart) = &mut self.state {
            chart.generation = Some(generation);
        }
        self.highest_applied = Some(generation);
        tracing::debug!(%generation, ?outcome, "chart rendered");
        outcome
    }

    pub fn is_stale(&self, generation: RunGeneration) -> bool {
        let superseded_by_applied = self.highest_applied.is_some_and(|h| generation < h);
        let superseded_by_started = self
            .generations
            .as_ref()
            .is_some_and(|g| !g.is_current(generation));
        superseded_by_applied || superseded_by_started
    }

    pub fn live(&self) -> Option<&PriceChart> {
        match &self.state {
            ChartState::Live(chart) => Some(chart),
            ChartState::Empty => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, ChartState::Live(_))
    }

    pub fn viewport_mut(&mut self) -> Option<&mut Viewport> {
        match &mut self.state {
            ChartState::Live(chart) => Some(chart.viewport_mut()),
            ChartState::Empty => None,
        }
    }

    /// How many times an instance has been created. Never more than one.
    pub fn constructions(&self) -> usize {
        self.constructions
    }
}
