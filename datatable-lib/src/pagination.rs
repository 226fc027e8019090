//! Pagination controller.
//!
//! Three modes:
//! - `Disabled`: every row is rendered.
//! - `Client`: the engine computes counts and slices the filtered, sorted rows.
//! - `Server`: the caller reports totals and hands over an already-paged row
//!   set; nothing is sliced.
//!
//! In server mode an active *local* filter switches the counts over to the
//! client-visible filtered rows and forces the visible page to 0, because the
//! server totals no longer describe what is on screen.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::preferences::PersistedPagination;

/// Page size used when neither preferences nor the caller provide one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page index (0-based) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationState {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }
}

/// Totals reported by the external data source in server mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerTotals {
    pub total_rows: usize,
    /// Reported page count; derived from `total_rows` when absent.
    pub page_count: Option<usize>,
}

/// Where page slicing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    Disabled,
    #[default]
    Client,
    Server(ServerTotals),
}

/// Callback invoked with the requested pagination state.
pub type PaginationCallback = Arc<dyn Fn(PaginationState) + Send + Sync>;

/// Who owns the pagination state. Resolved once, at construction.
#[derive(Clone)]
pub enum PaginationControl {
    /// The caller owns the state: the engine only emits change requests and
    /// waits for the caller to push the new state back.
    Controlled {
        state: PaginationState,
        on_change: PaginationCallback,
    },
    /// The engine owns the state, seeded from preferences, then `initial`,
    /// then the default.
    Uncontrolled { initial: Option<PaginationState> },
}

impl Default for PaginationControl {
    fn default() -> Self {
        PaginationControl::Uncontrolled { initial: None }
    }
}

impl fmt::Debug for PaginationControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaginationControl::Controlled { state, .. } => f
                .debug_struct("Controlled")
                .field("state", state)
                .finish_non_exhaustive(),
            PaginationControl::Uncontrolled { initial } => f
                .debug_struct("Uncontrolled")
                .field("initial", initial)
                .finish(),
        }
    }
}

/// Pagination configuration.
///
/// # Example
///
/// ```
/// use datatable_lib::pagination::PaginationOptions;
///
/// let client = PaginationOptions::client().with_page_size(25);
/// let server = PaginationOptions::server(500, None);
/// let off = PaginationOptions::disabled();
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaginationOptions {
    pub mode: PaginationMode,
    pub control: PaginationControl,
}

impl PaginationOptions {
    /// Client-side pagination, engine-owned state.
    pub fn client() -> Self {
        Self::default()
    }

    /// Server-side pagination with the reported totals.
    pub fn server(total_rows: usize, page_count: Option<usize>) -> Self {
        Self {
            mode: PaginationMode::Server(ServerTotals {
                total_rows,
                page_count,
            }),
            control: PaginationControl::default(),
        }
    }

    /// No pagination.
    pub fn disabled() -> Self {
        Self {
            mode: PaginationMode::Disabled,
            control: PaginationControl::default(),
        }
    }

    /// Sets the caller's default page size (engine-owned state).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.control = PaginationControl::Uncontrolled {
            initial: Some(PaginationState::new(0, page_size)),
        };
        self
    }

    /// Hands state ownership to the caller.
    pub fn controlled(
        mut self,
        state: PaginationState,
        on_change: impl Fn(PaginationState) + Send + Sync + 'static,
    ) -> Self {
        self.control = PaginationControl::Controlled {
            state,
            on_change: Arc::new(on_change),
        };
        self
    }
}

/// Resolved page for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub page_count: usize,
    pub can_previous: bool,
    pub can_next: bool,
    /// Range of the processed rows to render; `None` renders them all
    /// (server pages arrive pre-sliced).
    pub range: Option<Range<usize>>,
}

impl PageInfo {
    /// Applies the page range to the processed rows.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        match &self.range {
            Some(range) => &rows[range.start.min(rows.len())..range.end.min(rows.len())],
            None => rows,
        }
    }
}

enum Ownership {
    Controlled {
        state: PaginationState,
        on_change: PaginationCallback,
    },
    Uncontrolled {
        state: PaginationState,
        persisted_page_size: Option<usize>,
    },
}

/// Pagination state holder and page calculator.
pub struct PaginationController {
    mode: PaginationMode,
    ownership: Ownership,
}

impl PaginationController {
    /// Resolves ownership and seeds engine-owned state.
    pub fn new(options: PaginationOptions, persisted: Option<&PersistedPagination>) -> Self {
        let ownership = match options.control {
            PaginationControl::Controlled { state, on_change } => Ownership::Controlled { state, on_change },
            PaginationControl::Uncontrolled { initial } => {
                let fallback = initial.unwrap_or_default();
                let persisted_page_size = persisted.and_then(|p| p.page_size).filter(|&size| size > 0);
                let state = PaginationState {
                    page_index: persisted
                        .and_then(|p| p.page_index)
                        .unwrap_or(fallback.page_index),
                    page_size: persisted_page_size.unwrap_or(fallback.page_size).max(1),
                };
                Ownership::Uncontrolled {
                    state,
                    persisted_page_size,
                }
            }
        };
        Self {
            mode: options.mode,
            ownership,
        }
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.mode != PaginationMode::Disabled
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.ownership, Ownership::Controlled { .. })
    }

    /// Current page index and size.
    pub fn state(&self) -> PaginationState {
        match &self.ownership {
            Ownership::Controlled { state, .. } | Ownership::Uncontrolled { state, .. } => *state,
        }
    }

    /// Updates the totals reported by the server. Ignored outside server mode.
    pub fn set_server_totals(&mut self, total_rows: usize, page_count: Option<usize>) {
        if let PaginationMode::Server(totals) = &mut self.mode {
            *totals = ServerTotals {
                total_rows,
                page_count,
            };
        }
    }

    /// Pushes the caller's state in controlled mode.
    ///
    /// Returns `true` if the state changed.
    pub fn set_controlled_state(&mut self, next: PaginationState) -> bool {
        match &mut self.ownership {
            Ownership::Controlled { state, .. } if *state != next => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    /// Applies an externally changed default page size (engine-owned state).
    ///
    /// Resets the page index to 0, unless a persisted page size exists, which
    /// keeps priority. Returns `true` if the state changed.
    pub fn set_default_page_size(&mut self, page_size: usize) -> bool {
        match &mut self.ownership {
            Ownership::Uncontrolled {
                state,
                persisted_page_size: None,
            } if page_size > 0 && state.page_size != page_size => {
                *state = PaginationState::new(0, page_size);
                true
            }
            _ => false,
        }
    }

    /// Requests a page index, clamped to the available pages.
    ///
    /// Returns `true` if engine-owned state changed. In controlled mode the
    /// request goes to the caller's callback and `false` is returned.
    pub fn set_page_index(&mut self, page_index: usize, page_count: usize) -> bool {
        let current = self.state();
        let page_index = page_index.min(page_count.saturating_sub(1));
        self.request(PaginationState {
            page_index,
            ..current
        })
    }

    /// Requests a page size; the page index goes back to 0.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if page_size == 0 {
            log::warn!("[pagination] Ignoring page size of 0");
            return false;
        }
        self.request(PaginationState::new(0, page_size))
    }

    fn request(&mut self, next: PaginationState) -> bool {
        match &mut self.ownership {
            Ownership::Controlled { state, on_change } => {
                if *state != next {
                    on_change(next);
                }
                false
            }
            Ownership::Uncontrolled {
                state,
                persisted_page_size,
            } => {
                if *state == next {
                    return false;
                }
                if state.page_size != next.page_size {
                    *persisted_page_size = None;
                }
                *state = next;
                true
            }
        }
    }

    /// Computes the page for `filtered_rows` processed rows.
    ///
    /// `local_filter_active` only matters in server mode, where it switches
    /// the counts from the server totals to the filtered rows.
    pub fn resolve(&self, filtered_rows: usize, local_filter_active: bool) -> PageInfo {
        let state = self.state();
        let page_size = state.page_size.max(1);

        let (page_index, total_rows, page_count, range) = match self.mode {
            PaginationMode::Disabled => {
                let page_count = usize::from(filtered_rows > 0);
                (0, filtered_rows, page_count, None)
            }
            PaginationMode::Client => {
                let page_count = filtered_rows.div_ceil(page_size);
                // A shrunken row set may leave the stored index past the end.
                let page_index = state.page_index.min(page_count.saturating_sub(1));
                let start = page_index * page_size;
                let end = (start + page_size).min(filtered_rows);
                (page_index, filtered_rows, page_count, Some(start..end))
            }
            PaginationMode::Server(_) if local_filter_active => {
                let page_count = filtered_rows.div_ceil(page_size);
                (0, filtered_rows, page_count, Some(0..page_size.min(filtered_rows)))
            }
            PaginationMode::Server(totals) => {
                let page_count = totals
                    .page_count
                    .unwrap_or_else(|| totals.total_rows.div_ceil(page_size));
                (state.page_index, totals.total_rows, page_count, None)
            }
        };

        PageInfo {
            page_index,
            page_size: if self.is_enabled() { page_size } else { total_rows },
            total_rows,
            page_count,
            can_previous: page_index > 0,
            can_next: page_index + 1 < page_count,
            range,
        }
    }
}

impl fmt::Debug for PaginationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationController")
            .field("mode", &self.mode)
            .field("state", &self.state())
            .field("controlled", &self.is_controlled())
            .finish()
    }
}
