//! Patient progress timeline.
//!
//! Vitals, administrations and treatments are merged onto one sorted set of
//! minute labels so a chart can draw them against a shared x axis.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::WardService;
use crate::auth::{authorize, CurrentUser, Role};
use crate::db::queries;
use crate::error::Result;
use crate::models::administration::DoseEvent;
use crate::models::patient::PatientOption;
use crate::models::vital::{Treatment, Vital};

/// Label format shared by every series.
pub const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Marker base used when there are no vital values to sit above.
const FALLBACK_MAX_VALUE: f64 = 100.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineQuery {
    pub patient_id: Option<i64>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

/// Parallel arrays aligned on `labels`. `None` means "no value at this label".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineChart {
    pub labels: Vec<String>,
    pub bp: Vec<Option<f64>>,
    pub pulse: Vec<Option<f64>>,
    pub sugar: Vec<Option<f64>>,
    pub temp: Vec<Option<f64>>,
    /// Plot height where at least one administration happened.
    pub med_markers: Vec<Option<f64>>,
    pub med_tooltips: Vec<Option<Vec<String>>>,
    pub treatment_markers: Vec<Option<f64>>,
    pub treatment_tooltips: Vec<Option<Vec<String>>>,
}

impl TimelineChart {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientTimeline {
    pub patient_options: Vec<PatientOption>,
    pub selected_patient_id: Option<i64>,
    pub patient_name: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub report_period: String,
    #[serde(flatten)]
    pub chart: TimelineChart,
}

fn minute_of(ts: NaiveDateTime) -> NaiveDateTime {
    ts.date()
        .and_hms_opt(ts.hour(), ts.minute(), 0)
        .unwrap_or(ts)
}

/// Systolic value of a "systolic/diastolic" reading.
fn parse_systolic(bp: Option<&str>) -> Option<f64> {
    let systolic = bp?.split('/').next()?.trim();
    systolic.parse::<i64>().ok().map(|v| v as f64)
}

fn parse_measure(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn series_max(series: &[Option<f64>]) -> Option<f64> {
    series.iter().flatten().copied().reduce(f64::max)
}

/// Human-readable description of the requested window.
pub fn report_period(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> String {
    const DAY: &str = "%Y-%m-%d";
    match (from, to) {
        (Some(from), Some(to)) => format!("{} to {}", from.format(DAY), to.format(DAY)),
        (Some(from), None) => format!("From {}", from.format(DAY)),
        (None, Some(to)) => format!("Until {}", to.format(DAY)),
        (None, None) => "All Time".to_string(),
    }
}

/// Builds the aligned chart arrays from already-windowed records.
///
/// Events falling in the same minute share a label. Vital values that do not
/// parse leave their slot empty, and when two vitals share a minute the later
/// one wins. Markers sit a little above the highest vital value so they never
/// overlap the vital lines; treatment markers sit above medication markers.
pub fn assemble(vitals: &[Vital], doses: &[DoseEvent], treatments: &[Treatment]) -> TimelineChart {
    let minutes: BTreeSet<NaiveDateTime> = vitals
        .iter()
        .map(|v| v.recorded_at)
        .chain(doses.iter().map(|d| d.administered_at))
        .chain(treatments.iter().map(|t| t.performed_at))
        .map(minute_of)
        .collect();

    let index: BTreeMap<NaiveDateTime, usize> =
        minutes.iter().enumerate().map(|(i, ts)| (*ts, i)).collect();
    let slot = |ts: NaiveDateTime| index.get(&minute_of(ts)).copied();

    let n = minutes.len();
    let mut chart = TimelineChart {
        labels: minutes.iter().map(|ts| ts.format(LABEL_FORMAT).to_string()).collect(),
        bp: vec![None; n],
        pulse: vec![None; n],
        sugar: vec![None; n],
        temp: vec![None; n],
        med_markers: vec![None; n],
        med_tooltips: vec![None; n],
        treatment_markers: vec![None; n],
        treatment_tooltips: vec![None; n],
    };

    for vital in vitals {
        let Some(i) = slot(vital.recorded_at) else { continue };
        if let Some(v) = parse_systolic(vital.blood_pressure.as_deref()) {
            chart.bp[i] = Some(v);
        }
        if let Some(v) = parse_measure(vital.pulse_rate.as_deref()) {
            chart.pulse[i] = Some(v);
        }
        if let Some(v) = parse_measure(vital.sugar_level.as_deref()) {
            chart.sugar[i] = Some(v);
        }
        if let Some(v) = parse_measure(vital.temperature.as_deref()) {
            chart.temp[i] = Some(v);
        }
    }

    for dose in doses {
        let Some(i) = slot(dose.administered_at) else { continue };
        chart.med_tooltips[i]
            .get_or_insert_with(Vec::new)
            .push(format!("{} ({})", dose.medication_name, dose.dosage));
    }

    for treatment in treatments {
        let Some(i) = slot(treatment.performed_at) else { continue };
        chart.treatment_tooltips[i]
            .get_or_insert_with(Vec::new)
            .push(treatment.treatment_type.clone());
    }

    let max_value = [&chart.bp, &chart.pulse, &chart.sugar, &chart.temp]
        .into_iter()
        .filter_map(|series| series_max(series))
        .reduce(f64::max)
        .unwrap_or(FALLBACK_MAX_VALUE);
    let med_height = max_value + f64::max(5.0, max_value * 0.08);
    let treatment_height = med_height + max_value * 0.03;

    for i in 0..n {
        if chart.med_tooltips[i].is_some() {
            chart.med_markers[i] = Some(med_height);
        }
        if chart.treatment_tooltips[i].is_some() {
            chart.treatment_markers[i] = Some(treatment_height);
        }
    }

    chart
}

impl WardService {
    /// Progress timeline of one patient. An unknown or missing patient id
    /// falls back to the first patient in name order; with no patients at all
    /// the result is empty rather than an error.
    #[instrument(skip(self, actor, query), fields(staff_id = actor.staff_id, patient_id = ?query.patient_id))]
    pub async fn build_patient_timeline(
        &self,
        actor: &CurrentUser,
        query: &TimelineQuery,
    ) -> Result<PatientTimeline> {
        authorize(actor, &[Role::Nurse, Role::Sister])?;

        let mut conn = self.db.pool().acquire().await?;
        let patients = queries::list_patients(&mut *conn).await?;

        let selected = query
            .patient_id
            .and_then(|id| patients.iter().find(|p| p.id == id))
            .or_else(|| patients.first());

        let mut timeline = PatientTimeline {
            patient_options: patients.iter().map(PatientOption::from).collect(),
            selected_patient_id: selected.map(|p| p.id),
            patient_name: selected.map(|p| p.full_name()),
            from: query.from,
            to: query.to,
            report_period: report_period(query.from, query.to),
            chart: TimelineChart::default(),
        };

        let Some(patient) = selected else {
            debug!("no patients on record");
            return Ok(timeline);
        };

        let vitals = queries::patient_vitals(&mut *conn, patient.id, query.from, query.to).await?;
        let doses = queries::patient_dose_events(&mut *conn, patient.id, query.from, query.to).await?;
        let treatments = queries::patient_treatments(&mut *conn, patient.id, query.from, query.to).await?;

        timeline.chart = assemble(&vitals, &doses, &treatments);
        debug!(
            labels = timeline.chart.labels.len(),
            vitals = vitals.len(),
            doses = doses.len(),
            treatments = treatments.len(),
            "timeline assembled"
        );

        Ok(timeline)
    }
}
