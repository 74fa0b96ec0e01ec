//! Distance / time / pace calculator state machine
//!
//! All transitions go through [`reduce`]: the action is applied, then a
//! settle pass validates the lock and, in auto mode, derives the free field
//! that the locked field and the most recent edit determine. The settle pass
//! remembers the inputs it last wrote so that its own output is never
//! mistaken for a fresh user edit.

use crate::duration::{
    format_digits, format_distance, format_duration, format_field, format_pace, parse_distance,
    parse_duration, parse_field, parse_pace, DurationFormat,
};
use crate::models::{CalculationInputs, CalculatorMode, DistancePreset, Field, UnitSystem};
use crate::performance_index::performance_index_for_inputs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Stable message keys surfaced through the calculator's error field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKey {
    NeedTimePace,
    NeedDistancePace,
    NeedDistanceTime,
    InvalidInput,
}

impl ErrorKey {
    /// Key reported when the inputs needed to compute `target` are missing
    pub fn missing_for(target: Field) -> Self {
        match target {
            Field::Distance => ErrorKey::NeedTimePace,
            Field::Time => ErrorKey::NeedDistancePace,
            Field::Pace => ErrorKey::NeedDistanceTime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKey::NeedTimePace => "need-time-pace",
            ErrorKey::NeedDistancePace => "need-distance-pace",
            ErrorKey::NeedDistanceTime => "need-distance-time",
            ErrorKey::InvalidInput => "invalid-input",
        }
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed set of calculator transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Action {
    SetMode(CalculatorMode),
    UpdateField(Field, String),
    ToggleLock(Field),
    /// Manual-mode computation of the given field
    Calculate(Field),
    /// Shift a time or pace field by a number of seconds
    Adjust(Field, i32),
    /// Replace the distance outright
    AdjustDistance(String),
    SetPreset(Field, String),
    /// Fill the distance from a preset in the current unit system
    ApplyPreset(DistancePreset),
    SetUnitSystem(UnitSystem),
    Reset,
    ClearError,
}

impl Action {
    /// An edit to `field` as typed digit by digit, bucketed into segments
    /// Input field whose value this action writes, if any
    fn edited_field(&self) -> Option<Field> {
        match self {
            Action::UpdateField(field, _)
            | Action::Adjust(field, _)
            | Action::SetPreset(field, _) => Some(*field),
            Action::AdjustDistance(_) | Action::ApplyPreset(_) => Some(Field::Distance),
            _ => None,
        }
    }

    pub fn typed(field: Field, raw: &str) -> Self {
        let value = match input_format(field) {
            Some(format) if !raw.contains(':') => format_digits(raw, format),
            _ => raw.to_string(),
        };
        Action::UpdateField(field, value)
    }
}

/// Digit bucketing grammar for interactive input, if the field has one
pub fn input_format(field: Field) -> Option<DurationFormat> {
    match field {
        Field::Distance => None,
        Field::Time => Some(DurationFormat::Time),
        Field::Pace => Some(DurationFormat::Pace),
    }
}

/// Complete calculator state for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorState {
    pub inputs: CalculationInputs,
    pub locked_field: Option<Field>,
    pub mode: CalculatorMode,
    pub error: Option<ErrorKey>,
    pub unit_system: UnitSystem,
    /// Inputs as they stood right after the last auto-derived write
    #[serde(skip)]
    last_auto: Option<CalculationInputs>,
}

impl CalculatorState {
    pub fn new(mode: CalculatorMode, unit_system: UnitSystem) -> Self {
        Self {
            mode,
            unit_system,
            ..Default::default()
        }
    }

    pub fn with_inputs(mut self, inputs: CalculationInputs) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn is_field_locked(&self, field: Field) -> bool {
        self.locked_field == Some(field)
    }

    /// A field can be locked when it holds a strictly positive value
    pub fn can_lock_field(&self, field: Field) -> bool {
        parse_field(field, self.inputs.get(field))
            .map(|value| value > 0.0)
            .unwrap_or(false)
    }

    /// Whether a `Calculate(field)` would attempt a computation
    pub fn can_calculate(&self, field: Field) -> bool {
        let (a, b) = field.others();
        self.mode == CalculatorMode::Manual
            && !self.is_field_locked(field)
            && self.inputs.is_filled(a)
            && self.inputs.is_filled(b)
    }

    /// Whether a field accepts direct edits in the current mode
    pub fn is_field_editable(&self, field: Field) -> bool {
        !(self.mode == CalculatorMode::Auto && self.is_field_locked(field))
    }

    /// PI from the current distance and time, interpreted in the unit system
    pub fn performance_index(&self) -> Option<f64> {
        performance_index_for_inputs(&self.inputs.distance, &self.inputs.time, self.unit_system)
    }
}

/// Compute `target` from the other two fields.
///
/// `None` when either source does not parse, a divisor is zero, or the result
/// cannot be formatted.
pub fn derive_field(target: Field, inputs: &CalculationInputs) -> Option<String> {
    let value = match target {
        Field::Time => {
            let distance = parse_distance(&inputs.distance).ok()?;
            let pace = parse_pace(&inputs.pace).ok()?;
            distance * pace
        }
        Field::Distance => {
            let time = parse_duration(&inputs.time).ok()?;
            let pace = parse_pace(&inputs.pace).ok()?;
            if pace <= 0.0 {
                return None;
            }
            time / pace
        }
        Field::Pace => {
            let time = parse_duration(&inputs.time).ok()?;
            let distance = parse_distance(&inputs.distance).ok()?;
            if distance <= 0.0 {
                return None;
            }
            time / distance
        }
    };

    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let formatted = match target {
        Field::Distance => format_distance(value),
        Field::Time => format_duration(value),
        Field::Pace => format_pace(value),
    };
    (!formatted.is_empty()).then_some(formatted)
}

/// Apply `action` and settle the result
pub fn reduce(mut state: CalculatorState, action: Action) -> CalculatorState {
    let edited = action.edited_field();
    apply(&mut state, action);
    settle(&mut state, edited);
    state
}

fn apply(state: &mut CalculatorState, action: Action) {
    match action {
        Action::SetMode(mode) => {
            state.mode = mode;
            state.error = None;
        }

        Action::UpdateField(field, value) => {
            if !state.is_field_editable(field) {
                debug!(%field, "Ignoring edit to locked field");
                return;
            }
            state.inputs.set(field, value);
            state.error = None;
        }

        Action::ToggleLock(field) => {
            if state.is_field_locked(field) {
                state.locked_field = None;
            } else if state.can_lock_field(field) {
                state.locked_field = Some(field);
            } else {
                debug!(%field, "Field cannot be locked");
                return;
            }
            state.last_auto = None;
        }

        Action::Calculate(target) => calculate(state, target),

        Action::Adjust(field, delta_seconds) => {
            if field == Field::Distance {
                debug!("Distance adjustments take a replacement value");
                return;
            }
            if !state.is_field_editable(field) || !state.inputs.is_filled(field) {
                return;
            }
            let Ok(current) = parse_field(field, state.inputs.get(field)) else {
                debug!(%field, "Cannot adjust unparseable value");
                return;
            };
            let adjusted = (current + f64::from(delta_seconds) / 60.0).max(0.0);
            state.inputs.set(field, format_field(field, adjusted));
            state.error = None;
        }

        Action::AdjustDistance(value) => {
            if !state.is_field_editable(Field::Distance) {
                return;
            }
            state.inputs.distance = value;
            state.error = None;
        }

        Action::SetPreset(field, value) => {
            if state.is_field_locked(field) {
                debug!(%field, "Ignoring preset for locked field");
                return;
            }
            state.inputs.set(field, value);
            state.error = None;
        }

        Action::ApplyPreset(preset) => {
            let value = preset.value(state.unit_system).normalize().to_string();
            apply(state, Action::SetPreset(Field::Distance, value));
        }

        Action::SetUnitSystem(units) => {
            state.unit_system = units;
        }

        Action::Reset => {
            state.inputs = CalculationInputs::default();
            state.locked_field = None;
            state.error = None;
            state.last_auto = None;
        }

        Action::ClearError => {
            state.error = None;
        }
    }
}

fn calculate(state: &mut CalculatorState, target: Field) {
    if state.mode != CalculatorMode::Manual {
        debug!(%target, "Calculate is a manual-mode action");
        return;
    }
    if state.is_field_locked(target) {
        debug!(%target, "Refusing to overwrite locked field");
        return;
    }

    let (a, b) = target.others();
    if !state.inputs.is_filled(a) || !state.inputs.is_filled(b) {
        state.error = Some(ErrorKey::missing_for(target));
        return;
    }

    match derive_field(target, &state.inputs) {
        Some(value) => {
            state.inputs.set(target, value);
            state.error = None;
        }
        None => state.error = Some(ErrorKey::InvalidInput),
    }
}

/// Lock validation plus auto-mode derivation. Never raises an error.
///
/// Candidate sources are the two unlocked fields in [`Field::others`] order,
/// which sets the derivation priority, with the field `edited` by the current
/// action moved to the front. A candidate triggers when it is filled and it or
/// the locked field differs from the last auto-written snapshot, and never
/// overwrites the field just edited. The first candidate whose derivation
/// succeeds wins.
fn settle(state: &mut CalculatorState, edited: Option<Field>) {
    let Some(locked) = state.locked_field else {
        return;
    };

    if !state.inputs.is_filled(locked) {
        debug!(field = %locked, "Locked field emptied, unlocking");
        state.locked_field = None;
        state.last_auto = None;
        return;
    }

    if state.mode != CalculatorMode::Auto {
        return;
    }

    let changed = |field: Field| {
        state
            .last_auto
            .as_ref()
            .map_or(true, |snapshot| snapshot.get(field) != state.inputs.get(field))
    };
    let locked_changed = changed(locked);

    let (first, second) = locked.others();
    let mut candidates = [(first, second), (second, first)];
    if edited == Some(second) {
        candidates.swap(0, 1);
    }

    let triggers: Vec<(Field, Field)> = candidates
        .into_iter()
        .filter(|(_, target)| edited != Some(*target))
        .filter(|(source, _)| state.inputs.is_filled(*source) && (locked_changed || changed(*source)))
        .collect();

    for (source, target) in triggers {
        match derive_field(target, &state.inputs) {
            Some(value) => {
                trace!(locked = %locked, %source, %target, %value, "Auto-derived field");
                state.inputs.set(target, value);
                state.last_auto = Some(state.inputs.clone());
                return;
            }
            None => trace!(locked = %locked, %source, %target, "Auto-derivation skipped"),
        }
    }
}

/// Calculator session: owns the state and notifies a PI observer
pub struct Calculator {
    state: CalculatorState,
    reported_pi: Option<f64>,
    pi_listener: Option<Box<dyn FnMut(Option<f64>)>>,
}

impl fmt::Debug for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calculator")
            .field("state", &self.state)
            .field("reported_pi", &self.reported_pi)
            .field("has_pi_listener", &self.pi_listener.is_some())
            .finish()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(CalculatorMode::Manual, UnitSystem::Metric)
    }
}

impl Calculator {
    pub fn new(mode: CalculatorMode, unit_system: UnitSystem) -> Self {
        Self::from_state(CalculatorState::new(mode, unit_system))
    }

    pub fn from_state(state: CalculatorState) -> Self {
        let reported_pi = state.performance_index();
        Self {
            state,
            reported_pi,
            pi_listener: None,
        }
    }

    /// Register the observer called whenever the PI changes. Read
    /// [`Calculator::performance_index`] for the value at registration time.
    pub fn on_performance_index_change(&mut self, listener: impl FnMut(Option<f64>) + 'static) {
        self.pi_listener = Some(Box::new(listener));
    }

    pub fn dispatch(&mut self, action: Action) -> &CalculatorState {
        debug!(?action, "Dispatching calculator action");
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
        self.notify_performance_index();
        &self.state
    }

    fn notify_performance_index(&mut self) {
        let pi = self.state.performance_index();
        if pi == self.reported_pi {
            return;
        }
        self.reported_pi = pi;
        if let Some(listener) = self.pi_listener.as_mut() {
            listener(pi);
        }
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn inputs(&self) -> &CalculationInputs {
        &self.state.inputs
    }

    pub fn locked_field(&self) -> Option<Field> {
        self.state.locked_field
    }

    pub fn mode(&self) -> CalculatorMode {
        self.state.mode
    }

    pub fn error(&self) -> Option<ErrorKey> {
        self.state.error
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.state.unit_system
    }

    pub fn performance_index(&self) -> Option<f64> {
        self.reported_pi
    }

    pub fn can_lock_field(&self, field: Field) -> bool {
        self.state.can_lock_field(field)
    }

    pub fn is_field_locked(&self, field: Field) -> bool {
        self.state.is_field_locked(field)
    }

    pub fn can_calculate(&self, field: Field) -> bool {
        self.state.can_calculate(field)
    }
}

/// Errors from parsing a textual action
#[derive(Debug, thiserror::Error)]
pub enum ActionParseError {
    #[error("Empty action")]
    Empty,
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Script syntax, one action per line:
///
/// ```text
/// mode auto|manual
/// set <field> [value]        type <field> <digits>
/// lock <field>               calc <field>
/// adjust <field> <seconds>   distance <value>
/// preset <1k|5k|10k|half|marathon>
/// units metric|imperial      reset      clear-error
/// ```
impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        if verb.is_empty() {
            return Err(ActionParseError::Empty);
        }

        let (first, remainder) = match rest.split_once(char::is_whitespace) {
            Some((first, remainder)) => (first, remainder.trim()),
            None => (rest, ""),
        };

        let field = |name: &'static str| -> Result<Field, ActionParseError> {
            if first.is_empty() {
                return Err(ActionParseError::MissingArgument(name));
            }
            first.parse::<Field>().map_err(ActionParseError::InvalidArgument)
        };

        match verb.to_lowercase().as_str() {
            "mode" => rest
                .parse::<CalculatorMode>()
                .map(Action::SetMode)
                .map_err(ActionParseError::InvalidArgument),
            "set" => Ok(Action::UpdateField(field("set")?, remainder.to_string())),
            "type" => Ok(Action::typed(field("type")?, remainder)),
            "lock" => Ok(Action::ToggleLock(field("lock")?)),
            "calc" | "calculate" => Ok(Action::Calculate(field("calc")?)),
            "adjust" => {
                let field = field("adjust")?;
                if remainder.is_empty() {
                    return Err(ActionParseError::MissingArgument("adjust"));
                }
                let delta = remainder
                    .parse::<i32>()
                    .map_err(|_| ActionParseError::InvalidArgument(remainder.to_string()))?;
                Ok(Action::Adjust(field, delta))
            }
            "distance" => Ok(Action::AdjustDistance(rest.to_string())),
            "preset" => rest
                .parse::<DistancePreset>()
                .map(Action::ApplyPreset)
                .map_err(ActionParseError::InvalidArgument),
            "units" => rest
                .parse::<UnitSystem>()
                .map(Action::SetUnitSystem)
                .map_err(ActionParseError::InvalidArgument),
            "reset" => Ok(Action::Reset),
            "clear-error" => Ok(Action::ClearError),
            other => Err(ActionParseError::UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manual(distance: &str, time: &str, pace: &str) -> CalculatorState {
        CalculatorState::default().with_inputs(CalculationInputs::new(distance, time, pace))
    }

    fn run(state: CalculatorState, actions: Vec<Action>) -> CalculatorState {
        actions.into_iter().fold(state, reduce)
    }

    #[test]
    fn test_calculate_time_from_distance_and_pace() {
        let state = reduce(manual("10", "", "5:00"), Action::Calculate(Field::Time));
        assert_eq!(state.inputs.time, "50:00");
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_calculate_distance_from_time_and_pace() {
        let state = reduce(manual("", "50:00", "5:00"), Action::Calculate(Field::Distance));
        assert_eq!(state.inputs.distance, "10.00");
    }

    #[test]
    fn test_calculate_pace_from_distance_and_time() {
        let state = reduce(manual("10", "1:25:30", ""), Action::Calculate(Field::Pace));
        assert_eq!(state.inputs.pace, "8:33");
    }

    #[test]
    fn test_calculate_reports_missing_pair() {
        let state = reduce(manual("10", "", ""), Action::Calculate(Field::Time));
        assert_eq!(state.error, Some(ErrorKey::NeedDistancePace));
        assert_eq!(state.inputs, CalculationInputs::new("10", "", ""));

        let state = reduce(manual("", "", "5:00"), Action::Calculate(Field::Distance));
        assert_eq!(state.error, Some(ErrorKey::NeedTimePace));

        let state = reduce(manual("", "50:00", ""), Action::Calculate(Field::Pace));
        assert_eq!(state.error, Some(ErrorKey::NeedDistanceTime));
    }

    #[test]
    fn test_calculate_reports_invalid_input() {
        let state = reduce(manual("10", "", "5:75"), Action::Calculate(Field::Time));
        assert_eq!(state.error, Some(ErrorKey::InvalidInput));
        assert_eq!(state.inputs.time, "");

        let state = reduce(manual("", "50:00", "0:00"), Action::Calculate(Field::Distance));
        assert_eq!(state.error, Some(ErrorKey::InvalidInput));
    }

    #[test]
    fn test_calculate_ignored_in_auto_mode() {
        let mut state = manual("10", "", "5:00");
        state.mode = CalculatorMode::Auto;
        let after = reduce(state.clone(), Action::Calculate(Field::Time));
        assert_eq!(after.inputs.time, "");
        assert_eq!(after.error, None);
    }

    #[test]
    fn test_update_field_clears_error() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::Calculate(Field::Time),
                Action::UpdateField(Field::Pace, "5:00".to_string()),
            ],
        );
        assert_eq!(state.error, None);
        assert_eq!(state.inputs.pace, "5:00");
    }

    #[test]
    fn test_lock_requires_positive_value() {
        let state = reduce(manual("", "", ""), Action::ToggleLock(Field::Distance));
        assert_eq!(state.locked_field, None);

        let state = reduce(manual("0", "", ""), Action::ToggleLock(Field::Distance));
        assert_eq!(state.locked_field, None);

        let state = reduce(manual("", "abc", ""), Action::ToggleLock(Field::Time));
        assert_eq!(state.locked_field, None);

        let state = reduce(manual("10", "", ""), Action::ToggleLock(Field::Distance));
        assert_eq!(state.locked_field, Some(Field::Distance));
    }

    #[test]
    fn test_toggle_lock_switches_and_releases() {
        let state = run(
            manual("10", "50:00", "5:00"),
            vec![Action::ToggleLock(Field::Distance), Action::ToggleLock(Field::Pace)],
        );
        assert_eq!(state.locked_field, Some(Field::Pace));

        let state = reduce(state, Action::ToggleLock(Field::Pace));
        assert_eq!(state.locked_field, None);
    }

    #[test]
    fn test_manual_mode_lock_is_inert() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::ToggleLock(Field::Distance),
                Action::UpdateField(Field::Pace, "5:00".to_string()),
            ],
        );
        assert_eq!(state.locked_field, Some(Field::Distance));
        assert_eq!(state.inputs.time, "");
    }

    #[test]
    fn test_auto_mode_rejects_edit_to_locked_field() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::ToggleLock(Field::Distance),
                Action::SetMode(CalculatorMode::Auto),
                Action::UpdateField(Field::Distance, "5".to_string()),
            ],
        );
        assert_eq!(state.inputs.distance, "10");
    }

    #[test]
    fn test_auto_locked_distance_derives_time_then_pace() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Distance),
                Action::UpdateField(Field::Pace, "5:00".to_string()),
            ],
        );
        assert_eq!(state.inputs.time, "50:00");

        let state = reduce(state, Action::UpdateField(Field::Pace, "4:00".to_string()));
        assert_eq!(state.inputs.time, "40:00");

        let state = reduce(state, Action::UpdateField(Field::Time, "45:00".to_string()));
        assert_eq!(state.inputs.pace, "4:30");
        assert_eq!(state.inputs.time, "45:00");
    }

    #[test]
    fn test_auto_locked_time_derives_distance_and_pace() {
        let state = run(
            manual("", "50:00", ""),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Time),
                Action::UpdateField(Field::Pace, "5:00".to_string()),
            ],
        );
        assert_eq!(state.inputs.distance, "10.00");

        let state = reduce(state, Action::UpdateField(Field::Distance, "5".to_string()));
        assert_eq!(state.inputs.pace, "10:00");
    }

    #[test]
    fn test_auto_locked_pace_derives_time_and_distance() {
        let state = run(
            manual("", "", "5:00"),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Pace),
                Action::UpdateField(Field::Distance, "21.0975".to_string()),
            ],
        );
        assert_eq!(state.inputs.time, "1:45:29");

        let state = reduce(state, Action::UpdateField(Field::Time, "30:00".to_string()));
        assert_eq!(state.inputs.distance, "6.00");
    }

    #[test]
    fn test_auto_derivation_failure_is_silent() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Distance),
                Action::UpdateField(Field::Pace, "5:".to_string()),
            ],
        );
        assert_eq!(state.inputs.time, "");
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_auto_falls_back_when_preferred_source_is_invalid() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Distance),
                Action::UpdateField(Field::Pace, "5:00".to_string()),
                Action::UpdateField(Field::Pace, "4".to_string()),
            ],
        );
        assert_eq!(state.inputs.time, "50:00");
        assert_eq!(state.inputs.pace, "4");

        let state = reduce(state, Action::UpdateField(Field::Time, "45:00".to_string()));
        assert_eq!(state.inputs.pace, "4:30");
        assert_eq!(state.inputs.time, "45:00");
        assert_eq!(state.inputs.distance, "10");
    }

    #[test]
    fn test_auto_prefers_field_edited_by_current_action() {
        let state = run(
            manual("10", "40:00", "5:00"),
            vec![Action::SetMode(CalculatorMode::Auto), Action::ToggleLock(Field::Distance)],
        );
        // Fresh lock: pace outranks time
        assert_eq!(state.inputs.time, "50:00");

        let mut state = state;
        state.last_auto = None;
        let state = reduce(state, Action::UpdateField(Field::Time, "45:00".to_string()));
        assert_eq!(state.inputs.pace, "4:30");
        assert_eq!(state.inputs.time, "45:00");
    }

    #[test]
    fn test_auto_never_overwrites_the_field_being_typed() {
        let state = run(
            manual("10", "", "5:00"),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Distance),
            ],
        );
        assert_eq!(state.inputs.time, "50:00");

        let mut state = state;
        state.last_auto = None;
        let state = reduce(state, Action::UpdateField(Field::Time, "4".to_string()));
        assert_eq!(state.inputs.time, "4");
        assert_eq!(state.inputs.pace, "5:00");
    }

    #[test]
    fn test_same_value_edit_is_a_fixed_point() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::SetMode(CalculatorMode::Auto),
                Action::ToggleLock(Field::Distance),
                Action::UpdateField(Field::Pace, "4:59".to_string()),
            ],
        );
        let before = state.clone();

        let after = reduce(state, Action::UpdateField(Field::Pace, "4:59".to_string()));
        assert_eq!(after.inputs, before.inputs);

        let after = reduce(after, Action::UpdateField(Field::Time, before.inputs.time.clone()));
        assert_eq!(after.inputs, before.inputs);
    }

    #[test]
    fn test_emptied_lock_is_released() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::ToggleLock(Field::Distance),
                Action::UpdateField(Field::Distance, String::new()),
            ],
        );
        assert_eq!(state.locked_field, None);
    }

    #[test]
    fn test_adjust_time_and_pace() {
        let state = reduce(manual("", "50:00", "5:00"), Action::Adjust(Field::Pace, 5));
        assert_eq!(state.inputs.pace, "5:05");

        let state = reduce(state, Action::Adjust(Field::Time, -90));
        assert_eq!(state.inputs.time, "48:30");

        let state = reduce(manual("", "0:10", ""), Action::Adjust(Field::Time, -60));
        assert_eq!(state.inputs.time, "0:00");
    }

    #[test]
    fn test_adjust_is_noop_for_empty_or_locked_in_auto() {
        let state = reduce(manual("", "", ""), Action::Adjust(Field::Pace, 5));
        assert_eq!(state.inputs.pace, "");

        let state = run(
            manual("", "", "5:00"),
            vec![
                Action::ToggleLock(Field::Pace),
                Action::SetMode(CalculatorMode::Auto),
                Action::Adjust(Field::Pace, 5),
            ],
        );
        assert_eq!(state.inputs.pace, "5:00");
    }

    #[test]
    fn test_adjust_distance_respects_auto_lock() {
        let state = reduce(manual("10", "", ""), Action::AdjustDistance("12".to_string()));
        assert_eq!(state.inputs.distance, "12");

        let state = run(
            manual("10", "", ""),
            vec![
                Action::ToggleLock(Field::Distance),
                Action::SetMode(CalculatorMode::Auto),
                Action::AdjustDistance("12".to_string()),
            ],
        );
        assert_eq!(state.inputs.distance, "10");
    }

    #[test]
    fn test_preset_blocked_by_lock_in_any_mode() {
        let state = run(
            manual("10", "", ""),
            vec![
                Action::ToggleLock(Field::Distance),
                Action::ApplyPreset(DistancePreset::Marathon),
            ],
        );
        assert_eq!(state.inputs.distance, "10");

        let state = reduce(manual("", "", ""), Action::ApplyPreset(DistancePreset::HalfMarathon));
        assert_eq!(state.inputs.distance, "21.0975");

        let mut imperial = manual("", "", "");
        imperial.unit_system = UnitSystem::Imperial;
        let state = reduce(imperial, Action::ApplyPreset(DistancePreset::TenK));
        assert_eq!(state.inputs.distance, "6.21");
    }

    #[test]
    fn test_reset_keeps_mode_and_units() {
        let mut state = manual("10", "50:00", "5:00");
        state.mode = CalculatorMode::Auto;
        state.unit_system = UnitSystem::Imperial;
        let state = run(state, vec![Action::ToggleLock(Field::Time), Action::Reset]);
        assert_eq!(state.inputs, CalculationInputs::default());
        assert_eq!(state.locked_field, None);
        assert_eq!(state.mode, CalculatorMode::Auto);
        assert_eq!(state.unit_system, UnitSystem::Imperial);
    }

    #[test]
    fn test_predicates() {
        let state = manual("10", "", "5:00");
        assert!(state.can_calculate(Field::Time));
        assert!(!state.can_calculate(Field::Distance));
        assert!(state.can_lock_field(Field::Pace));
        assert!(!state.can_lock_field(Field::Time));

        let state = reduce(state, Action::ToggleLock(Field::Time));
        assert!(!state.is_field_locked(Field::Time));
        let state = reduce(state, Action::ToggleLock(Field::Pace));
        assert!(state.is_field_locked(Field::Pace));
        assert!(!state.can_calculate(Field::Pace));
    }

    #[test]
    fn test_calculator_notifies_on_pi_change_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut calculator = Calculator::default();
        calculator.on_performance_index_change(move |pi| sink.borrow_mut().push(pi));

        calculator.dispatch(Action::UpdateField(Field::Distance, "10".to_string()));
        assert!(seen.borrow().is_empty());

        calculator.dispatch(Action::UpdateField(Field::Time, "50:00".to_string()));
        calculator.dispatch(Action::UpdateField(Field::Pace, "5:00".to_string()));
        calculator.dispatch(Action::UpdateField(Field::Time, "".to_string()));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!((seen[0].unwrap() - 40.0).abs() < 1.0);
        assert_eq!(seen[1], None);
        assert_eq!(calculator.performance_index(), None);
    }

    #[test]
    fn test_unit_system_changes_pi() {
        let mut calculator = Calculator::default();
        calculator.dispatch(Action::UpdateField(Field::Distance, "10".to_string()));
        calculator.dispatch(Action::UpdateField(Field::Time, "50:00".to_string()));
        let metric = calculator.performance_index().unwrap();

        calculator.dispatch(Action::SetUnitSystem(UnitSystem::Imperial));
        let imperial = calculator.performance_index().unwrap();
        assert!(imperial > metric);
        assert_eq!(calculator.inputs().distance, "10");
    }

    #[test]
    fn test_typed_action_buckets_digits() {
        assert_eq!(
            Action::typed(Field::Time, "12530"),
            Action::UpdateField(Field::Time, "1:25:30".to_string())
        );
        assert_eq!(
            Action::typed(Field::Pace, "530"),
            Action::UpdateField(Field::Pace, "5:30".to_string())
        );
        assert_eq!(
            Action::typed(Field::Distance, "10.5"),
            Action::UpdateField(Field::Distance, "10.5".to_string())
        );
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("mode auto".parse::<Action>().unwrap(), Action::SetMode(CalculatorMode::Auto));
        assert_eq!(
            "set pace 5:00".parse::<Action>().unwrap(),
            Action::UpdateField(Field::Pace, "5:00".to_string())
        );
        assert_eq!(
            "set time".parse::<Action>().unwrap(),
            Action::UpdateField(Field::Time, String::new())
        );
        assert_eq!("lock distance".parse::<Action>().unwrap(), Action::ToggleLock(Field::Distance));
        assert_eq!("calc t".parse::<Action>().unwrap(), Action::Calculate(Field::Time));
        assert_eq!("adjust pace -5".parse::<Action>().unwrap(), Action::Adjust(Field::Pace, -5));
        assert_eq!(
            "preset 5k".parse::<Action>().unwrap(),
            Action::ApplyPreset(DistancePreset::FiveK)
        );
        assert_eq!("reset".parse::<Action>().unwrap(), Action::Reset);

        assert!(matches!("".parse::<Action>(), Err(ActionParseError::Empty)));
        assert!(matches!("jump".parse::<Action>(), Err(ActionParseError::UnknownAction(_))));
        assert!(matches!("lock".parse::<Action>(), Err(ActionParseError::MissingArgument(_))));
        assert!(matches!("adjust pace x".parse::<Action>(), Err(ActionParseError::InvalidArgument(_))));
    }

    use proptest::prelude::*;

    fn arb_field() -> impl Strategy<Value = Field> {
        prop_oneof![Just(Field::Distance), Just(Field::Time), Just(Field::Pace)]
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            arb_field().prop_map(Action::ToggleLock),
            arb_field().prop_map(Action::Calculate),
            prop_oneof![Just(CalculatorMode::Manual), Just(CalculatorMode::Auto)]
                .prop_map(Action::SetMode),
            (arb_field(), prop_oneof![
                Just(String::new()),
                Just("10".to_string()),
                Just("5:00".to_string()),
                Just("4:30".to_string()),
                Just("50:00".to_string()),
                Just("1:25:30".to_string()),
                Just("x".to_string()),
            ])
                .prop_map(|(field, value)| Action::UpdateField(field, value)),
            (prop_oneof![Just(Field::Time), Just(Field::Pace)], -120i32..120)
                .prop_map(|(field, delta)| Action::Adjust(field, delta)),
        ]
    }

    proptest! {
        #[test]
        fn test_lock_only_held_on_filled_field(actions in prop::collection::vec(arb_action(), 0..40)) {
            let state = run(manual("", "", ""), actions);
            if let Some(field) = state.locked_field {
                prop_assert!(state.inputs.is_filled(field));
            }
        }

        #[test]
        fn test_repeating_an_edit_changes_nothing(
            actions in prop::collection::vec(arb_action(), 0..30),
            field in arb_field()
        ) {
            let state = run(manual("", "", ""), actions);
            let current = state.inputs.get(field).to_string();
            let after = reduce(state.clone(), Action::UpdateField(field, current));
            prop_assert_eq!(&after.inputs, &state.inputs);
        }
    }
}
