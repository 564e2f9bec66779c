//! Per-identity dialogue state.

use super::calendar::CalendarStepper;
use crate::db::{NewUser, Role};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Registration,
    Login,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    AwaitingName,
    AwaitingSurname,
    AwaitingBirthdate,
    AwaitingRole,
    AwaitingUsername,
    AwaitingPassword,
}

/// Fields captured so far. Only fields of completed steps are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub role: Option<Role>,
    pub username: Option<String>,
}

impl Fields {
    /// Assemble a registration once every field is present.
    pub fn to_new_user(&self, identity: i64) -> Option<NewUser> {
        Some(NewUser {
            identity,
            name: self.name.clone()?,
            surname: self.surname.clone()?,
            birthdate: self.birthdate?,
            username: self.username.clone()?,
            role: self.role?,
        })
    }
}

/// One in-flight dialogue.
#[derive(Debug, Clone)]
pub struct Dialogue {
    pub flow: Flow,
    pub step: Step,
    pub fields: Fields,
    /// Present only while `step` is [`Step::AwaitingBirthdate`].
    pub calendar: Option<CalendarStepper>,
    /// Unix seconds of the last event applied.
    pub touched_at: i64,
}

impl Dialogue {
    pub fn registration(now: i64) -> Self {
        Self {
            flow: Flow::Registration,
            step: Step::AwaitingName,
            fields: Fields::default(),
            calendar: None,
            touched_at: now,
        }
    }

    pub fn login(now: i64) -> Self {
        Self {
            flow: Flow::Login,
            step: Step::AwaitingUsername,
            fields: Fields::default(),
            calendar: None,
            touched_at: now,
        }
    }

    pub fn is_idle(&self, now: i64, idle_secs: i64) -> bool {
        now.saturating_sub(self.touched_at) >= idle_secs
    }
}
