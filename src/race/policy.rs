/// What a race does with a child's completion on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The completion wins the race, if nothing has won yet.
    Decide,
    /// The completion is kept as the fallback outcome, replacing any previous fallback.
    Remember,
    /// The completion is kept as the fallback outcome, unless one is kept already.
    RememberIfEmpty,
}

/// Decides, per channel, which child completions end a race.
pub trait Policy: Send + Sync + 'static {
    const ON_VALUE: Verdict;
    const ON_ERROR: Verdict;
    const ON_STOPPED: Verdict;
}

/// The first completion of any kind wins. Used by [`when_any`](super::when_any) and
/// [`stop_when`](super::stop_when).
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyCompletion;

/// The first value wins. Without one, the race ends with the last error seen, or stopped if no
/// child failed. Used by [`first_successful`](super::first_successful).
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSuccess;

impl Policy for AnyCompletion {
    const ON_VALUE: Verdict = Verdict::Decide;
    const ON_ERROR: Verdict = Verdict::Decide;
    const ON_STOPPED: Verdict = Verdict::Decide;
}

impl Policy for FirstSuccess {
    const ON_VALUE: Verdict = Verdict::Decide;
    const ON_ERROR: Verdict = Verdict::Remember;
    const ON_STOPPED: Verdict = Verdict::RememberIfEmpty;
}
