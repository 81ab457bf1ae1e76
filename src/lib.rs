//! Cycle prediction engine and the local tracker built around it.
//!
//! The engine (`prediction`, `phase`, `calendar`, `chart`, `insights`) is pure:
//! callers pass period history and "today" explicitly and get the same answer
//! for the same inputs. `service`, `repository` and `storage` are the layer
//! that fetches history and feeds it in.

pub mod calendar;
pub mod chart;
pub mod config;
pub mod crypto;
pub mod insights;
pub mod logging;
pub mod models;
pub mod phase;
pub mod prediction;
pub mod pregnancy;
pub mod repository;
pub mod service;
pub mod session;
pub mod storage;

pub use calendar::{annotate_month, month_grid, month_view, CalendarDay, DayMark, MonthView};
pub use insights::{compute_insights, CycleOverview, Insights};
pub use models::{FertilityWindow, FlowLevel, PeriodRecord, Severity, Symptom, UserProfile};
pub use phase::{classify_phase, classify_phase_default, CyclePhase, PhaseInfo};
pub use prediction::{average_cycle_length, fertility_window, predict_next_period};
pub use pregnancy::{current_week, next_milestone, Milestone, PregnancyStatus};
pub use repository::{CycleRepository, MemoryRepository};
pub use service::{Tracker, TrackerError};
pub use session::Session;
