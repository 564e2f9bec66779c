//! Registration and login dialogues.
//!
//! One [`Dialogue`] per identity, held in a `DashMap`. An event takes the
//! entry out of the map, advances it, and puts it back unless the dialogue
//! finished. The transport delivers events for one identity in order, so no
//! lock is held across the storage awaits.

pub mod calendar;
pub mod effect;
pub mod event;
pub mod state;

pub use calendar::{CalendarInput, CalendarProgress, CalendarStep, CalendarStepper, CalendarView};
pub use effect::{Choice, DialogueEffect, MessageId};
pub use event::{DecodeError, DialogueEvent, RawInput};
pub use state::{Dialogue, Fields, Flow, Step};

use crate::db::{Role, UserSummary};
use crate::error::{AuthError, Conflict, FieldError, SERVICE_UNAVAILABLE};
use crate::metrics;
use crate::services::auth::{AuthService, LogoutResult, SessionResult};
use crate::validation::{
    min_birthdate, parse_date, validate_birthdate, validate_name, validate_username,
};
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

const NO_DIALOGUE: &str = "No operation in progress. Type /start to begin.";
const TIMED_OUT: &str = "Your previous operation timed out. Type /start to begin again.";
const CANCELLED: &str = "Operation cancelled. Type /start to begin again.";

/// Whether a dialogue survives the event just applied.
enum Transition {
    Stay,
    Done,
}

pub struct DialogueEngine {
    auth: AuthService,
    dialogues: DashMap<i64, Dialogue>,
    idle_secs: i64,
}

impl DialogueEngine {
    pub fn new(auth: AuthService, idle_timeout: Duration) -> Self {
        Self {
            auth,
            dialogues: DashMap::new(),
            idle_secs: i64::try_from(idle_timeout.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Number of dialogues in flight.
    pub fn active(&self) -> usize {
        self.dialogues.len()
    }

    /// Copy of the dialogue held for `identity`, if any.
    pub fn snapshot(&self, identity: i64) -> Option<Dialogue> {
        self.dialogues.get(&identity).map(|d| d.clone())
    }

    /// Decode raw input for `identity` against its current step. While a
    /// password is awaited every message is the password, commands included;
    /// the prompt offers a Cancel button instead.
    pub fn decode(
        &self,
        identity: i64,
        raw: RawInput,
        session_token: Option<String>,
    ) -> Result<DialogueEvent, DecodeError> {
        let awaiting_password = self
            .dialogues
            .get(&identity)
            .is_some_and(|d| d.step == Step::AwaitingPassword);
        match raw {
            RawInput::Message { message_id, text } if awaiting_password => {
                Ok(DialogueEvent::Text {
                    message_id,
                    text: Zeroizing::new(text),
                })
            }
            raw => DialogueEvent::decode(raw, session_token),
        }
    }

    /// Apply one event for `identity` and return the effects for the host.
    pub async fn handle(&self, identity: i64, event: DialogueEvent) -> Vec<DialogueEffect> {
        metrics::record_dialogue_event(event.kind());
        debug!(identity, event = ?event, "Dialogue event");

        let now = self.auth.clock().now();
        let effects = match event {
            DialogueEvent::Start { token } => {
                self.dialogues.remove(&identity);
                self.start(identity, token.as_deref()).await
            }
            DialogueEvent::BeginRegistration => self.begin_registration(identity, now).await,
            DialogueEvent::BeginLogin => {
                let dialogue = Dialogue::login(now);
                let prompt = self.prompt_for(&dialogue);
                self.dialogues.insert(identity, dialogue);
                vec![prompt]
            }
            DialogueEvent::Cancel => {
                if self.dialogues.remove(&identity).is_some() {
                    info!(identity, "Dialogue cancelled");
                }
                vec![DialogueEffect::reply(CANCELLED)]
            }
            DialogueEvent::Logout { token } => {
                self.dialogues.remove(&identity);
                self.logout(&token).await
            }
            input => self.step(identity, input, now).await,
        };

        metrics::set_active_dialogues(self.dialogues.len());
        effects
    }

    /// Drop dialogues idle for at least the configured timeout.
    pub fn evict_idle(&self) -> usize {
        let now = self.auth.clock().now();
        let mut evicted = 0;
        self.dialogues.retain(|_, dialogue| {
            let idle = dialogue.is_idle(now, self.idle_secs);
            if idle {
                evicted += 1;
            }
            !idle
        });
        if evicted > 0 {
            info!(evicted, "Evicted idle dialogues");
        }
        metrics::set_active_dialogues(self.dialogues.len());
        evicted
    }

    // ========== Entry points ==========

    async fn start(&self, identity: i64, token: Option<&str>) -> Vec<DialogueEffect> {
        let mut out = Vec::new();

        if let Some(token) = token {
            match self.auth.validate_session(token).await {
                SessionResult::Active(profile) => {
                    let text = format!(
                        "Welcome back, {} {}! Please select one of the following options:",
                        profile.name, profile.surname
                    );
                    out.push(menu(&profile, text));
                    return out;
                }
                SessionResult::Invalid => {
                    out.push(DialogueEffect::reply(AuthError::SessionExpired.user_message()));
                    out.push(DialogueEffect::SessionEnded);
                }
                SessionResult::StorageFailure => {
                    out.push(DialogueEffect::reply(unavailable()));
                    return out;
                }
            }
        }

        match self.auth.profile(identity).await {
            Ok(Some(user)) => out.push(DialogueEffect::prompt(
                format!("Welcome back, {}! Please log in to continue.", user.name),
                vec![login_choice()],
            )),
            Ok(None) => out.push(DialogueEffect::prompt(
                "Welcome! You are not registered yet. Please register to continue.",
                vec![Choice::new("Register", "register_init"), login_choice()],
            )),
            Err(e) => out.push(DialogueEffect::reply(e.user_message())),
        }
        out
    }

    async fn begin_registration(&self, identity: i64, now: i64) -> Vec<DialogueEffect> {
        match self.auth.profile(identity).await {
            Ok(Some(_)) => vec![DialogueEffect::reply(
                AuthError::Conflict(Conflict::IdentityRegistered).user_message(),
            )],
            Ok(None) => {
                let dialogue = Dialogue::registration(now);
                let prompt = self.prompt_for(&dialogue);
                self.dialogues.insert(identity, dialogue);
                vec![DialogueEffect::reply("Starting registration."), prompt]
            }
            Err(e) => vec![DialogueEffect::reply(e.user_message())],
        }
    }

    async fn logout(&self, token: &str) -> Vec<DialogueEffect> {
        match self.auth.logout(token).await {
            LogoutResult::Revoked => vec![
                DialogueEffect::reply("You have been logged out. Type /start to log in again."),
                DialogueEffect::SessionEnded,
            ],
            LogoutResult::NotFound => vec![
                DialogueEffect::reply("Your session had already ended. Type /start to log in."),
                DialogueEffect::SessionEnded,
            ],
            LogoutResult::StorageFailure => vec![DialogueEffect::reply(unavailable())],
        }
    }

    // ========== In-flight steps ==========

    async fn step(&self, identity: i64, event: DialogueEvent, now: i64) -> Vec<DialogueEffect> {
        let Some((_, mut dialogue)) = self.dialogues.remove(&identity) else {
            return vec![DialogueEffect::reply(NO_DIALOGUE)];
        };
        if dialogue.is_idle(now, self.idle_secs) {
            debug!(identity, "Dialogue expired before event");
            let mut out = Vec::new();
            if let (Step::AwaitingPassword, DialogueEvent::Text { message_id, .. }) =
                (dialogue.step, &event)
            {
                out.push(DialogueEffect::Redact {
                    message_id: *message_id,
                });
            }
            out.push(DialogueEffect::reply(TIMED_OUT));
            return out;
        }
        dialogue.touched_at = now;

        let mut out = Vec::new();
        match self.advance(identity, &mut dialogue, event, &mut out).await {
            Transition::Stay => {
                self.dialogues.insert(identity, dialogue);
            }
            Transition::Done => debug!(identity, flow = ?dialogue.flow, "Dialogue finished"),
        }
        out
    }

    async fn advance(
        &self,
        identity: i64,
        d: &mut Dialogue,
        event: DialogueEvent,
        out: &mut Vec<DialogueEffect>,
    ) -> Transition {
        match (d.step, event) {
            (Step::AwaitingName, DialogueEvent::Text { text, .. }) => {
                match validate_name("name", &text) {
                    Ok(name) => {
                        d.fields.name = Some(name);
                        d.step = Step::AwaitingSurname;
                        out.push(self.prompt_for(d));
                    }
                    Err(e) => self.reject(d, e, out),
                }
            }
            (Step::AwaitingSurname, DialogueEvent::Text { text, .. }) => {
                match validate_name("surname", &text) {
                    Ok(surname) => {
                        d.fields.surname = Some(surname);
                        d.step = Step::AwaitingBirthdate;
                        d.calendar = Some(CalendarStepper::new(min_birthdate(), self.today()));
                        out.push(self.prompt_for(d));
                    }
                    Err(e) => self.reject(d, e, out),
                }
            }
            (Step::AwaitingBirthdate, DialogueEvent::Calendar(input)) => {
                let today = self.today();
                let calendar = d
                    .calendar
                    .get_or_insert_with(|| CalendarStepper::new(min_birthdate(), today));
                match calendar.apply(input) {
                    Ok(CalendarProgress::Pending(view)) => out.push(calendar_prompt(view)),
                    Ok(CalendarProgress::Resolved(date)) => self.accept_birthdate(d, date, out),
                    Err(e) => self.reject(d, e, out),
                }
            }
            (Step::AwaitingBirthdate, DialogueEvent::Text { text, .. }) => {
                match parse_date(&text).and_then(|date| validate_birthdate(date, self.today())) {
                    Ok(date) => self.accept_birthdate(d, date, out),
                    Err(e) => self.reject(d, e, out),
                }
            }
            (Step::AwaitingRole, DialogueEvent::ChooseRole(role)) if role != Role::Admin => {
                d.fields.role = Some(role);
                d.step = Step::AwaitingUsername;
                out.push(self.prompt_for(d));
            }
            (Step::AwaitingUsername, DialogueEvent::Text { text, .. }) => {
                match validate_username(&text) {
                    Ok(username) => {
                        d.fields.username = Some(username);
                        d.step = Step::AwaitingPassword;
                        out.push(self.prompt_for(d));
                    }
                    Err(e) => self.reject(d, e, out),
                }
            }
            (Step::AwaitingPassword, DialogueEvent::Text { message_id, text }) => {
                out.push(DialogueEffect::Redact { message_id });
                return match d.flow {
                    Flow::Registration => self.complete_registration(identity, d, &text, out).await,
                    Flow::Login => self.complete_login(d, &text, out).await,
                };
            }
            _ => self.reject(d, FieldError::UnexpectedInput, out),
        }
        Transition::Stay
    }

    async fn complete_registration(
        &self,
        identity: i64,
        d: &mut Dialogue,
        password: &str,
        out: &mut Vec<DialogueEffect>,
    ) -> Transition {
        let Some(user) = d.fields.to_new_user(identity) else {
            warn!(identity, "Registration dialogue reached password step incomplete");
            out.push(DialogueEffect::reply(TIMED_OUT));
            return Transition::Done;
        };

        match self.auth.try_register(user, password).await {
            Ok(user) => {
                out.push(DialogueEffect::reply(format!(
                    "Registration complete! Welcome, {} {}. Your role: {}. Type /start to log in.",
                    user.name, user.surname, user.role
                )));
                Transition::Done
            }
            Err(AuthError::Validation(e)) => {
                self.reject(d, e, out);
                Transition::Stay
            }
            Err(e) if e.is_retryable() => {
                out.push(DialogueEffect::reply(e.user_message()));
                out.push(self.prompt_for(d));
                Transition::Stay
            }
            Err(e) => {
                out.push(DialogueEffect::reply(e.user_message()));
                Transition::Done
            }
        }
    }

    async fn complete_login(
        &self,
        d: &mut Dialogue,
        password: &str,
        out: &mut Vec<DialogueEffect>,
    ) -> Transition {
        let Some(username) = d.fields.username.clone() else {
            out.push(DialogueEffect::reply(TIMED_OUT));
            return Transition::Done;
        };

        match self.auth.try_login(&username, password).await {
            Ok(auth) => {
                let text = format!(
                    "Login successful! Welcome, {} {} (role: {}). Please select one of the following options:",
                    auth.profile.name, auth.profile.surname, auth.profile.role
                );
                let menu = menu(&auth.profile, text);
                out.push(DialogueEffect::Authenticated {
                    token: auth.token,
                    profile: auth.profile,
                });
                out.push(menu);
                Transition::Done
            }
            Err(e) if e.is_retryable() => {
                out.push(DialogueEffect::reply(e.user_message()));
                out.push(self.prompt_for(d));
                Transition::Stay
            }
            Err(e) => {
                out.push(DialogueEffect::reply(e.user_message()));
                Transition::Done
            }
        }
    }

    fn accept_birthdate(&self, d: &mut Dialogue, date: NaiveDate, out: &mut Vec<DialogueEffect>) {
        d.fields.birthdate = Some(date);
        d.calendar = None;
        d.step = Step::AwaitingRole;
        out.push(DialogueEffect::reply(format!("Birthdate saved: {date}.")));
        out.push(self.prompt_for(d));
    }

    /// Report a bad input and ask for the same step again.
    fn reject(&self, d: &Dialogue, err: FieldError, out: &mut Vec<DialogueEffect>) {
        out.push(DialogueEffect::reply(AuthError::Validation(err).user_message()));
        out.push(self.prompt_for(d));
    }

    fn prompt_for(&self, d: &Dialogue) -> DialogueEffect {
        match (d.step, d.flow) {
            (Step::AwaitingName, _) => DialogueEffect::reply("Please, enter your Name:"),
            (Step::AwaitingSurname, _) => DialogueEffect::reply("Please, enter your Surname:"),
            (Step::AwaitingBirthdate, _) => {
                let view = match &d.calendar {
                    Some(calendar) => calendar.view(),
                    None => CalendarStepper::new(min_birthdate(), self.today()).view(),
                };
                calendar_prompt(view)
            }
            (Step::AwaitingRole, _) => DialogueEffect::prompt(
                "What is your role?",
                vec![
                    Choice::new("Follower", "role_follower"),
                    Choice::new("Leader", "role_leader"),
                ],
            ),
            (Step::AwaitingUsername, Flow::Registration) => {
                DialogueEffect::reply("Please, choose a Username (no spaces):")
            }
            (Step::AwaitingUsername, Flow::Login) => {
                DialogueEffect::reply("Please, enter your Username to log in:")
            }
            (Step::AwaitingPassword, Flow::Registration) => {
                DialogueEffect::prompt("Please, choose a Password:", vec![cancel_choice()])
            }
            (Step::AwaitingPassword, Flow::Login) => {
                DialogueEffect::prompt("Please, enter your Password:", vec![cancel_choice()])
            }
        }
    }

    fn today(&self) -> NaiveDate {
        self.auth.clock().today()
    }
}

/// Periodically evict idle dialogues.
pub fn spawn_idle_sweep(engine: Arc<DialogueEngine>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            engine.evict_idle();
        }
    })
}

fn calendar_prompt(view: CalendarView) -> DialogueEffect {
    DialogueEffect::Calendar {
        text: format!("Please, select your birth {}:", view.step.label()),
        view,
    }
}

fn login_choice() -> Choice {
    Choice::new("Login", "login_init")
}

fn cancel_choice() -> Choice {
    Choice::new("Cancel", "cancel")
}

fn unavailable() -> String {
    SERVICE_UNAVAILABLE.to_string()
}

fn menu(profile: &UserSummary, text: String) -> DialogueEffect {
    let mut choices = vec![Choice::new("View Events", "events_list")];
    if profile.role == Role::Admin {
        choices.push(Choice::new("Check-In Scan", "admin_checkin"));
        choices.push(Choice::new("Admin Management", "admin_user_mgmt"));
    }
    choices.push(Choice::new("Logout", "logout"));
    DialogueEffect::Menu { text, choices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::Database;

    async fn engine() -> (DialogueEngine, Arc<ManualClock>) {
        let db = Database::new(":memory:").await.unwrap();
        let clock = Arc::new(ManualClock::at_date(
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        ));
        let auth = AuthService::new(
            Arc::new(db),
            clock.clone(),
            Duration::from_secs(1800),
            Duration::from_secs(5),
        );
        (DialogueEngine::new(auth, Duration::from_secs(900)), clock)
    }

    fn texts(effects: &[DialogueEffect]) -> Vec<&str> {
        effects.iter().filter_map(DialogueEffect::text).collect()
    }

    async fn register_via_calendar(engine: &DialogueEngine, identity: i64, username: &str) {
        engine.handle(identity, DialogueEvent::BeginRegistration).await;
        engine.handle(identity, DialogueEvent::text(1, "Ana")).await;
        engine.handle(identity, DialogueEvent::text(2, "Lee")).await;
        engine.handle(identity, DialogueEvent::Calendar(CalendarInput::Year(1995))).await;
        engine.handle(identity, DialogueEvent::Calendar(CalendarInput::Month(6))).await;
        engine.handle(identity, DialogueEvent::Calendar(CalendarInput::Day(15))).await;
        engine.handle(identity, DialogueEvent::ChooseRole(Role::Leader)).await;
        engine.handle(identity, DialogueEvent::text(3, username)).await;
        let done = engine.handle(identity, DialogueEvent::text(4, "Secr3t!")).await;
        assert_eq!(done[0], DialogueEffect::Redact { message_id: 4 });
        assert!(texts(&done)[0].starts_with("Registration complete"));
    }

    #[tokio::test]
    async fn test_registration_walks_every_step() {
        let (engine, _clock) = engine().await;
        register_via_calendar(&engine, 10, "ana").await;

        assert_eq!(engine.active(), 0);
        let user = engine.auth().profile(10).await.unwrap().unwrap();
        assert_eq!(user.birthdate, NaiveDate::from_ymd_opt(1995, 6, 15).unwrap());
        assert_eq!(user.role, Role::Leader);
    }

    #[tokio::test]
    async fn test_login_emits_redact_then_token() {
        let (engine, _clock) = engine().await;
        register_via_calendar(&engine, 10, "ana").await;

        engine.handle(10, DialogueEvent::BeginLogin).await;
        let prompt = engine.handle(10, DialogueEvent::text(5, "ana")).await;
        assert_eq!(texts(&prompt), vec!["Please, enter your Password:"]);

        let effects = engine.handle(10, DialogueEvent::text(6, "Secr3t!")).await;
        assert_eq!(effects[0], DialogueEffect::Redact { message_id: 6 });
        let DialogueEffect::Authenticated { token, profile } = &effects[1] else {
            panic!("expected Authenticated, got {effects:?}");
        };
        assert_eq!(token.len(), 43);
        assert_eq!(profile.identity, 10);
        assert!(matches!(effects[2], DialogueEffect::Menu { .. }));
        assert!(engine.snapshot(10).is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_ends_login() {
        let (engine, _clock) = engine().await;
        register_via_calendar(&engine, 10, "ana").await;

        engine.handle(10, DialogueEvent::BeginLogin).await;
        engine.handle(10, DialogueEvent::text(5, "ana")).await;
        let effects = engine.handle(10, DialogueEvent::text(6, "nope")).await;
        assert_eq!(effects[0], DialogueEffect::Redact { message_id: 6 });
        assert!(texts(&effects)[0].contains("Invalid username or password"));
        assert!(engine.snapshot(10).is_none());
    }

    #[tokio::test]
    async fn test_bad_birthdate_keeps_fields() {
        let (engine, _clock) = engine().await;
        engine.handle(11, DialogueEvent::BeginRegistration).await;
        engine.handle(11, DialogueEvent::text(1, "Ana")).await;
        engine.handle(11, DialogueEvent::text(2, "Lee")).await;

        let effects = engine.handle(11, DialogueEvent::text(3, "2090-01-01")).await;
        assert!(texts(&effects)[0].contains("outside the allowed range"));

        let d = engine.snapshot(11).unwrap();
        assert_eq!(d.step, Step::AwaitingBirthdate);
        assert_eq!(d.fields.name.as_deref(), Some("Ana"));
        assert_eq!(d.fields.surname.as_deref(), Some("Lee"));

        engine.handle(11, DialogueEvent::text(4, "1990-02-03")).await;
        assert_eq!(engine.snapshot(11).unwrap().step, Step::AwaitingRole);
    }

    #[tokio::test]
    async fn test_unexpected_input_reprompts() {
        let (engine, _clock) = engine().await;
        engine.handle(12, DialogueEvent::BeginRegistration).await;
        let effects = engine.handle(12, DialogueEvent::ChooseRole(Role::Follower)).await;
        assert_eq!(texts(&effects)[1], "Please, enter your Name:");
        assert_eq!(engine.snapshot(12).unwrap().step, Step::AwaitingName);
    }

    #[tokio::test]
    async fn test_cancel_discards() {
        let (engine, _clock) = engine().await;
        engine.handle(13, DialogueEvent::BeginRegistration).await;
        engine.handle(13, DialogueEvent::text(1, "Ana")).await;
        engine.handle(13, DialogueEvent::Cancel).await;
        assert!(engine.snapshot(13).is_none());

        let effects = engine.handle(13, DialogueEvent::text(2, "Lee")).await;
        assert_eq!(texts(&effects), vec![NO_DIALOGUE]);
    }

    #[tokio::test]
    async fn test_decode_depends_on_step() {
        let (engine, _clock) = engine().await;
        let typed = |text: &str| RawInput::Message {
            message_id: 1,
            text: text.to_string(),
        };

        assert!(matches!(engine.decode(14, typed("/cancel"), None), Ok(DialogueEvent::Cancel)));

        engine.handle(14, DialogueEvent::BeginLogin).await;
        engine.handle(14, DialogueEvent::text(1, "ana")).await;
        let Ok(DialogueEvent::Text { text, .. }) = engine.decode(14, typed("/cancel"), None) else {
            panic!("password step should take commands as text");
        };
        assert_eq!(text.as_str(), "/cancel");
        assert!(matches!(
            engine.decode(14, RawInput::Callback { data: "cancel".into() }, None),
            Ok(DialogueEvent::Cancel)
        ));
    }

    #[tokio::test]
    async fn test_idle_dialogues_evicted() {
        let (engine, clock) = engine().await;
        engine.handle(14, DialogueEvent::BeginLogin).await;
        clock.advance(899);
        assert_eq!(engine.evict_idle(), 0);
        clock.advance(1);
        assert_eq!(engine.evict_idle(), 1);
        assert_eq!(engine.active(), 0);
    }

    #[tokio::test]
    async fn test_start_offers_register_only_when_unknown() {
        let (engine, _clock) = engine().await;
        let effects = engine.handle(15, DialogueEvent::Start { token: None }).await;
        let DialogueEffect::Prompt { choices, .. } = &effects[0] else {
            panic!("expected prompt");
        };
        assert_eq!(choices.len(), 2);

        register_via_calendar(&engine, 15, "ana").await;
        let effects = engine.handle(15, DialogueEvent::Start { token: None }).await;
        let DialogueEffect::Prompt { choices, .. } = &effects[0] else {
            panic!("expected prompt");
        };
        assert_eq!(choices, &vec![login_choice()]);

        let again = engine.handle(15, DialogueEvent::BeginRegistration).await;
        assert!(texts(&again)[0].contains("already registered"));
        assert!(engine.snapshot(15).is_none());
    }

    #[tokio::test]
    async fn test_start_with_expired_token() {
        let (engine, clock) = engine().await;
        register_via_calendar(&engine, 16, "ana").await;
        let token = engine.auth().sessions().issue(16).await.unwrap();

        let effects = engine
            .handle(16, DialogueEvent::Start { token: Some(token.clone()) })
            .await;
        assert!(matches!(effects[0], DialogueEffect::Menu { .. }));

        clock.advance(1800);
        let effects = engine.handle(16, DialogueEvent::Start { token: Some(token) }).await;
        assert!(texts(&effects)[0].contains("session has expired"));
        assert!(effects.contains(&DialogueEffect::SessionEnded));
    }

    #[tokio::test]
    async fn test_logout_event() {
        let (engine, _clock) = engine().await;
        register_via_calendar(&engine, 17, "ana").await;
        let token = engine.auth().sessions().issue(17).await.unwrap();

        let effects = engine.handle(17, DialogueEvent::Logout { token: token.clone() }).await;
        assert!(texts(&effects)[0].contains("logged out"));
        let effects = engine.handle(17, DialogueEvent::Logout { token }).await;
        assert!(texts(&effects)[0].contains("already ended"));
    }
}
