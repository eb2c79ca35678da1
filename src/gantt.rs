//! Timeline layout: places each task along a date axis padded by a week on
//! both sides, with offsets and widths expressed as percentages of the axis.

use crate::task::{Priority, Task, TaskStatus};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

pub const PADDING_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttRow {
    pub id: String,
    pub title: String,
    pub assignee: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub progress: u8,
    pub duration_days: i64,
    pub start_offset_percent: f64,
    pub width_percent: f64,
}

impl GanttRow {
    /// Width of the completed part of the bar.
    pub fn progress_width_percent(&self) -> f64 {
        self.width_percent * f64::from(self.progress) / 100.0
    }

    /// Map the bar onto `width` character cells as `(first cell, length)`.
    /// Short bars still get one cell so they stay visible.
    pub fn cells(&self, width: usize) -> (usize, usize) {
        if width == 0 {
            return (0, 0);
        }
        let start = ((self.start_offset_percent / 100.0) * width as f64).floor() as usize;
        let start = start.min(width - 1);
        let len = ((self.width_percent / 100.0) * width as f64).round() as usize;
        (start, len.clamp(1, width - start))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttLayout {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: i64,
    pub rows: Vec<GanttRow>,
}

impl GanttLayout {
    /// Lay out `tasks`. With no tasks the axis collapses to `today`.
    pub fn from_tasks<'a, I>(tasks: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let tasks: Vec<&Task> = tasks.into_iter().collect();
        let bounds = tasks
            .iter()
            .flat_map(|t| [t.start_date, t.end_date])
            .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            });

        let Some((min, max)) = bounds else {
            return Self {
                start: today,
                end: today,
                total_days: 0,
                rows: Vec::new(),
            };
        };

        let start = min - Duration::days(PADDING_DAYS);
        let end = max + Duration::days(PADDING_DAYS);
        let total_days = (end - start).num_days();
        let scale = 100.0 / total_days as f64;

        let rows = tasks
            .iter()
            .map(|t| {
                let offset = (t.start_date - start).num_days();
                let duration = t.duration_days();
                GanttRow {
                    id: t.id.clone(),
                    title: t.title.clone(),
                    assignee: t.assignee.clone(),
                    status: t.status,
                    priority: t.priority,
                    progress: t.progress,
                    duration_days: duration,
                    start_offset_percent: offset as f64 * scale,
                    width_percent: duration as f64 * scale,
                }
            })
            .collect();

        Self {
            start,
            end,
            total_days,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header dates, one per week from the padded start through the end.
    pub fn week_markers(&self) -> Vec<NaiveDate> {
        if self.rows.is_empty() {
            return Vec::new();
        }
        let mut markers = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            markers.push(current);
            current += Duration::days(7);
        }
        markers
    }
}
