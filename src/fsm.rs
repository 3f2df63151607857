//! Minimal finite-state-machine dispatcher.
//!
//! `S` is the state type (usually a fieldless enum) and `C` is the context the
//! callbacks mutate. Each state maps to a [`StateCallbacks`] record of up to
//! three function pointers, and the whole mapping lives in a [`StateTable`]
//! built once up front. The machine decides when each callback runs; the
//! callbacks decide what happens.
//!
//! # Usage
//! ```
//! use locomotion::fsm::{StateCallbacks, StateMachine, StateTable, Tick};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Light { Off, On }
//!
//! fn off_update(presses: &mut u32, tick: &mut Tick<Light>) {
//!     if *presses > 0 { tick.go(Light::On); }
//! }
//!
//! let table = StateTable::new()
//!     .state(Light::Off, StateCallbacks::new().on_update(off_update))
//!     .state(Light::On, StateCallbacks::new());
//! let mut fsm = StateMachine::new(Light::Off, table).unwrap();
//! let mut presses = 1;
//! fsm.tick(&mut presses, 1.0 / 60.0);
//! assert_eq!(fsm.state(), Light::On);
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::FsmError;

/// Per-state lifecycle callback. May request a transition through the [`Tick`].
pub type StateFn<S, C> = fn(&mut C, &mut Tick<S>);

/// Global hook. Runs every tick regardless of state and cannot transition.
pub type HookFn<S, C> = fn(&mut C, &Tick<S>);

/// Up to three optional callbacks for one state. Missing callbacks are no-ops.
pub struct StateCallbacks<S, C> {
    pub enter: Option<StateFn<S, C>>,
    pub update: Option<StateFn<S, C>>,
    pub exit: Option<StateFn<S, C>>,
}

impl<S, C> StateCallbacks<S, C> {
    pub fn new() -> Self {
        Self {
            enter: None,
            update: None,
            exit: None,
        }
    }

    pub fn on_enter(mut self, f: StateFn<S, C>) -> Self {
        self.enter = Some(f);
        self
    }

    pub fn on_update(mut self, f: StateFn<S, C>) -> Self {
        self.update = Some(f);
        self
    }

    pub fn on_exit(mut self, f: StateFn<S, C>) -> Self {
        self.exit = Some(f);
        self
    }
}

impl<S, C> Default for StateCallbacks<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

// Function pointers are always Copy; derive would wrongly require `S: Copy, C: Copy`.
impl<S, C> Clone for StateCallbacks<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C> Copy for StateCallbacks<S, C> {}

/// Explicit mapping from state value to its callbacks, plus the two global hooks.
pub struct StateTable<S, C> {
    states: HashMap<S, StateCallbacks<S, C>>,
    early: Option<HookFn<S, C>>,
    late: Option<HookFn<S, C>>,
}

impl<S: Copy + Eq + Hash, C> StateTable<S, C> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            early: None,
            late: None,
        }
    }

    /// Register `state`. Registering the same state twice replaces its record.
    pub fn state(mut self, state: S, callbacks: StateCallbacks<S, C>) -> Self {
        self.states.insert(state, callbacks);
        self
    }

    /// Hook run at the start of every tick, before any per-state callback.
    pub fn early(mut self, f: HookFn<S, C>) -> Self {
        self.early = Some(f);
        self
    }

    /// Hook run at the end of every tick, after any per-state callback.
    pub fn late(mut self, f: HookFn<S, C>) -> Self {
        self.late = Some(f);
        self
    }

    pub fn contains(&self, state: S) -> bool {
        self.states.contains_key(&state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<S: Copy + Eq + Hash, C> Default for StateTable<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Request<S> {
    /// Ignored if the target is already active.
    Go(S),
    /// Always exits and re-enters, even into the active state.
    Restart(S),
}

/// View of the machine handed to callbacks for one tick.
#[derive(Debug)]
pub struct Tick<S> {
    state: S,
    now: f32,
    dt: f32,
    elapsed: f32,
    request: Option<Request<S>>,
}

impl<S: Copy> Tick<S> {
    /// The state whose callback is running.
    pub fn state(&self) -> S {
        self.state
    }

    /// Simulation time at the start of this tick, in seconds.
    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Seconds spent in the current state before this tick.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Request a transition to `next`. Re-targeting the active state is a no-op.
    /// The last request written during a callback wins.
    pub fn go(&mut self, next: S) {
        self.request = Some(Request::Go(next));
    }

    /// Like [`go`](Self::go), but **always** transitions even if `next` is the
    /// active state, so its exit and enter callbacks fire again.
    pub fn restart(&mut self, next: S) {
        self.request = Some(Request::Restart(next));
    }
}

/// Flat finite-state machine: exactly one active state, no history stack.
pub struct StateMachine<S, C> {
    state: S,
    previous: S,
    /// Seconds spent in the current state. Reset to 0.0 on each transition.
    elapsed: f32,
    clock: f32,
    /// Whether the active state's enter callback has already fired.
    entered: bool,
    table: StateTable<S, C>,
}

impl<S, C> StateMachine<S, C>
where
    S: Copy + Eq + Hash + Debug,
{
    /// Create a machine starting in `initial`. Its enter callback fires on the
    /// first tick.
    pub fn new(initial: S, table: StateTable<S, C>) -> Result<Self, FsmError> {
        if !table.contains(initial) {
            return Err(FsmError::UnregisteredState(format!("{:?}", initial)));
        }
        Ok(Self {
            state: initial,
            previous: initial,
            elapsed: 0.0,
            clock: 0.0,
            entered: false,
            table,
        })
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn previous(&self) -> S {
        self.previous
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Accumulated simulation time, i.e. the `now` the next tick will see.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Run one simulation step:
    /// early hook → pending enter → update (→ exit on transition) → late hook.
    pub fn tick(&mut self, ctx: &mut C, dt: f32) {
        if let Some(early) = self.table.early {
            early(ctx, &self.view(dt));
        }

        self.run_enter(ctx, dt);

        if let Some(update) = self.callbacks(self.state).update {
            let mut tick = self.view(dt);
            update(ctx, &mut tick);
            if let Some(request) = tick.request {
                self.transition(ctx, request, dt);
            }
        }

        if let Some(late) = self.table.late {
            late(ctx, &self.view(dt));
        }

        self.elapsed += dt;
        self.clock += dt;
    }

    /// Fire enter for a newly active state. An enter callback may re-target
    /// immediately; the chain is followed within the same tick.
    fn run_enter(&mut self, ctx: &mut C, dt: f32) {
        let mut hops = 0;
        while !self.entered {
            self.entered = true;
            let Some(enter) = self.callbacks(self.state).enter else {
                break;
            };
            let mut tick = self.view(dt);
            enter(ctx, &mut tick);
            if let Some(request) = tick.request {
                if self.transition(ctx, request, dt) {
                    hops += 1;
                    assert!(
                        hops <= self.table.len(),
                        "enter callbacks re-targeted in a cycle (last target {:?})",
                        self.state
                    );
                }
            }
        }
    }

    /// Apply a request. Returns `true` if the active state was exited.
    fn transition(&mut self, ctx: &mut C, request: Request<S>, dt: f32) -> bool {
        let next = match request {
            Request::Go(next) if next == self.state => return false,
            Request::Go(next) | Request::Restart(next) => next,
        };
        assert!(
            self.table.contains(next),
            "transition from {:?} to unregistered state {:?}",
            self.state,
            next
        );

        if let Some(exit) = self.callbacks(self.state).exit {
            // Exit callbacks cannot redirect a transition already underway.
            exit(ctx, &mut self.view(dt));
        }

        log::debug!("[fsm] {:?} -> {:?}", self.state, next);
        self.previous = std::mem::replace(&mut self.state, next);
        self.elapsed = 0.0;
        self.entered = false;
        true
    }

    fn callbacks(&self, state: S) -> StateCallbacks<S, C> {
        match self.table.states.get(&state) {
            Some(callbacks) => *callbacks,
            None => panic!("state {:?} is not registered in the dispatch table", state),
        }
    }

    fn view(&self, dt: f32) -> Tick<S> {
        Tick {
            state: self.state,
            now: self.clock,
            dt,
            elapsed: self.elapsed,
            request: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Door {
        Closed,
        Open,
        Locked,
        Ghost,
    }

    #[derive(Default)]
    struct Log {
        events: Vec<String>,
        next: Option<Door>,
        restart: bool,
    }

    fn record(log: &mut Log, tick: &Tick<Door>, what: &str) {
        log.events.push(format!("{}:{:?}", what, tick.state()));
    }

    fn enter(log: &mut Log, tick: &mut Tick<Door>) {
        record(log, tick, "enter");
    }

    fn exit(log: &mut Log, tick: &mut Tick<Door>) {
        record(log, tick, "exit");
    }

    fn update(log: &mut Log, tick: &mut Tick<Door>) {
        record(log, tick, "update");
        if let Some(next) = log.next.take() {
            if log.restart {
                tick.restart(next);
            } else {
                tick.go(next);
            }
        }
    }

    fn early(log: &mut Log, tick: &Tick<Door>) {
        log.events.push(format!("early:{:?}", tick.state()));
    }

    fn late(log: &mut Log, tick: &Tick<Door>) {
        log.events.push(format!("late:{:?}", tick.state()));
    }

    fn full() -> StateCallbacks<Door, Log> {
        StateCallbacks::new()
            .on_enter(enter)
            .on_update(update)
            .on_exit(exit)
    }

    fn machine() -> StateMachine<Door, Log> {
        let table = StateTable::new()
            .state(Door::Closed, full())
            .state(Door::Open, full())
            .state(Door::Locked, StateCallbacks::new())
            .early(early)
            .late(late);
        StateMachine::new(Door::Closed, table).unwrap()
    }

    #[test]
    fn first_tick_enters_initial_state() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.tick(&mut log, 0.5);
        assert_eq!(
            log.events,
            vec!["early:Closed", "enter:Closed", "update:Closed", "late:Closed"]
        );
    }

    #[test]
    fn exit_fires_after_update_and_enter_on_next_tick() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.tick(&mut log, 0.5);
        log.events.clear();

        log.next = Some(Door::Open);
        fsm.tick(&mut log, 0.5);
        assert_eq!(
            log.events,
            vec!["early:Closed", "update:Closed", "exit:Closed", "late:Open"]
        );
        assert_eq!(fsm.state(), Door::Open);
        assert_eq!(fsm.previous(), Door::Closed);

        log.events.clear();
        fsm.tick(&mut log, 0.5);
        assert_eq!(
            log.events,
            vec!["early:Open", "enter:Open", "update:Open", "late:Open"]
        );
    }

    #[test]
    fn going_to_the_active_state_is_a_no_op() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.tick(&mut log, 0.25);
        log.next = Some(Door::Closed);
        fsm.tick(&mut log, 0.25);
        fsm.tick(&mut log, 0.25);
        let enters = log.events.iter().filter(|e| *e == "enter:Closed").count();
        let exits = log.events.iter().filter(|e| *e == "exit:Closed").count();
        assert_eq!((enters, exits), (1, 0));
        assert!((fsm.elapsed() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn restart_re_enters_the_active_state() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.tick(&mut log, 0.25);
        log.next = Some(Door::Closed);
        log.restart = true;
        fsm.tick(&mut log, 0.25);
        fsm.tick(&mut log, 0.25);
        let enters = log.events.iter().filter(|e| *e == "enter:Closed").count();
        let exits = log.events.iter().filter(|e| *e == "exit:Closed").count();
        assert_eq!((enters, exits), (2, 1));
        assert_eq!(fsm.elapsed(), 0.5);
    }

    #[test]
    fn states_without_callbacks_are_legal() {
        let mut fsm = machine();
        let mut log = Log::default();
        log.next = Some(Door::Locked);
        fsm.tick(&mut log, 0.1);
        log.events.clear();
        fsm.tick(&mut log, 0.1);
        assert_eq!(log.events, vec!["early:Locked", "late:Locked"]);
        assert_eq!(fsm.state(), Door::Locked);
    }

    #[test]
    fn clock_and_elapsed_advance_by_dt() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.tick(&mut log, 0.5);
        fsm.tick(&mut log, 0.5);
        assert_eq!(fsm.clock(), 1.0);
        log.next = Some(Door::Open);
        fsm.tick(&mut log, 0.5);
        // The transition resets elapsed before this tick's dt is added.
        assert_eq!(fsm.elapsed(), 0.5);
        assert_eq!(fsm.clock(), 1.5);
    }

    fn retarget_enter(log: &mut Log, tick: &mut Tick<Door>) {
        record(log, tick, "enter");
        tick.go(Door::Open);
    }

    #[test]
    fn enter_can_retarget_within_the_same_tick() {
        let table = StateTable::new()
            .state(
                Door::Closed,
                StateCallbacks::new()
                    .on_enter(retarget_enter)
                    .on_update(update)
                    .on_exit(exit),
            )
            .state(Door::Open, full());
        let mut fsm = StateMachine::new(Door::Closed, table).unwrap();
        let mut log = Log::default();
        fsm.tick(&mut log, 0.1);
        assert_eq!(
            log.events,
            vec!["enter:Closed", "exit:Closed", "enter:Open", "update:Open"]
        );
        assert_eq!(fsm.state(), Door::Open);
    }

    fn ping(_: &mut Log, tick: &mut Tick<Door>) {
        tick.go(Door::Open);
    }

    fn pong(_: &mut Log, tick: &mut Tick<Door>) {
        tick.go(Door::Closed);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn enter_cycles_fail_fast() {
        let table = StateTable::new()
            .state(Door::Closed, StateCallbacks::new().on_enter(ping))
            .state(Door::Open, StateCallbacks::new().on_enter(pong));
        let mut fsm = StateMachine::new(Door::Closed, table).unwrap();
        fsm.tick(&mut Log::default(), 0.1);
    }

    #[test]
    #[should_panic(expected = "unregistered state Ghost")]
    fn transition_to_unregistered_state_fails_fast() {
        let mut fsm = machine();
        let mut log = Log {
            next: Some(Door::Ghost),
            ..Log::default()
        };
        fsm.tick(&mut log, 0.1);
    }

    #[test]
    fn unregistered_initial_state_is_rejected() {
        let table: StateTable<Door, Log> = StateTable::new().state(Door::Open, full());
        assert!(matches!(
            StateMachine::new(Door::Ghost, table),
            Err(FsmError::UnregisteredState(name)) if name == "Ghost"
        ));
    }

    fn close_after_a_second(_: &mut Log, tick: &mut Tick<Door>) {
        if tick.elapsed() >= 1.0 {
            tick.go(Door::Closed);
        }
    }

    #[test]
    fn update_sees_time_spent_in_state() {
        let table = StateTable::new()
            .state(Door::Open, StateCallbacks::new().on_update(close_after_a_second))
            .state(Door::Closed, StateCallbacks::new());
        let mut fsm = StateMachine::new(Door::Open, table).unwrap();
        let mut log = Log::default();
        for _ in 0..4 {
            fsm.tick(&mut log, 0.25);
        }
        assert_eq!(fsm.state(), Door::Open);
        fsm.tick(&mut log, 0.25);
        assert_eq!(fsm.state(), Door::Closed);
        assert_eq!(fsm.elapsed(), 0.25);
    }
}
