// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    ALL, Confirmation, EngineResult, Field, FilterEngine, FilterState, GridLayout, Location,
    MutationId, MutationOp, MutationRequest, OptimisticMutations, PageState, Record, RecordId,
    Settlement, TabKind, ViewportFacts, clamp_page, compute_page_size, items_per_row, paginate,
    total_pages,
};

/// Side effects the owner of a list view must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// The committed page changed; persist the new location.
    LocationChanged(Location),
    ScrollToTop,
    PageSizeChanged(usize),
}

/// What the presentation layer draws for one list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPresentation<'a> {
    pub page_records: Vec<&'a Record>,
    pub total_pages: usize,
    pub current_page: usize,
    pub total_matches: usize,
    pub per_row: usize,
    pub show_controls: bool,
}

/// One mounted list page: its own copy of the collection plus filter,
/// paging and pending-change state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    tab: TabKind,
    records: Vec<Record>,
    engine: FilterEngine,
    filter: FilterState,
    page: PageState,
    layout: GridLayout,
    per_row: usize,
    mutations: OptimisticMutations,
    location: Location,
}

impl ListView {
    pub fn new(
        tab: TabKind,
        records: Vec<Record>,
        location: &Location,
        layout: GridLayout,
        viewport: &ViewportFacts,
    ) -> Self {
        let mut view = Self {
            tab,
            records,
            engine: FilterEngine::for_kind(tab.entity()),
            filter: FilterState::default(),
            page: PageState {
                current_page: location.page(),
                page_size: compute_page_size(viewport, &layout),
            },
            layout,
            per_row: items_per_row(viewport, &layout),
            mutations: OptimisticMutations::new(tab.entity()),
            location: Location::new(tab.route()).with_page(location.page()),
        };
        view.reconcile_page();
        view
    }

    pub fn tab(&self) -> TabKind {
        self.tab
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_in_flight(&self, id: RecordId) -> bool {
        self.mutations.is_in_flight(id)
    }

    pub fn filtered(&self) -> Vec<&Record> {
        self.engine.apply(&self.records, &self.filter)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page.page_size)
    }

    pub fn presentation(&self) -> ListPresentation<'_> {
        let filtered = self.filtered();
        let slice = paginate(&filtered, self.page);
        ListPresentation {
            page_records: slice.records.to_vec(),
            total_pages: slice.total_pages,
            current_page: slice.current_page,
            total_matches: filtered.len(),
            per_row: self.per_row,
            show_controls: slice.show_controls(),
        }
    }

    /// Recomputes page size from fresh viewport facts and re-clamps the page.
    pub fn on_viewport(&mut self, viewport: &ViewportFacts) -> Vec<ListEvent> {
        self.per_row = items_per_row(viewport, &self.layout);
        let page_size = compute_page_size(viewport, &self.layout);
        if page_size == self.page.page_size {
            return Vec::new();
        }
        self.page.page_size = page_size;
        let mut events = vec![ListEvent::PageSizeChanged(page_size)];
        events.extend(self.reconcile_page());
        events
    }

    pub fn set_search(&mut self, term: impl Into<String>) -> Vec<ListEvent> {
        self.filter.search_term = term.into();
        self.reset_to_first_page()
    }

    pub fn push_search_char(&mut self, ch: char) -> Vec<ListEvent> {
        self.filter.search_term.push(ch);
        self.reset_to_first_page()
    }

    pub fn pop_search_char(&mut self) -> Vec<ListEvent> {
        self.filter.search_term.pop();
        self.reset_to_first_page()
    }

    pub fn set_category(&mut self, field: Field, value: impl Into<String>) -> Vec<ListEvent> {
        self.filter.set_category(field, value);
        self.reset_to_first_page()
    }

    /// Advances `field` to its next value present in the collection,
    /// wrapping back to `all`. Returns the new value.
    pub fn cycle_category(&mut self, field: Field) -> (String, Vec<ListEvent>) {
        let options = self.engine.category_options(&self.records, field);
        let current = self.filter.category(field);
        let position = options
            .iter()
            .position(|option| option == current)
            .unwrap_or(0);
        let next = options
            .get((position + 1) % options.len())
            .cloned()
            .unwrap_or_else(|| ALL.to_owned());
        let events = self.set_category(field, next.clone());
        (next, events)
    }

    pub fn clear_filters(&mut self) -> Vec<ListEvent> {
        self.filter.clear();
        self.reset_to_first_page()
    }

    /// Moves to `requested`, clamped into range. Emits nothing when the
    /// clamped page is the current one.
    pub fn set_page(&mut self, requested: usize) -> Vec<ListEvent> {
        let clamped = clamp_page(requested, self.total_pages());
        if clamped == self.page.current_page {
            return Vec::new();
        }
        self.page.current_page = clamped;
        self.location = self.location.clone().with_page(clamped);
        vec![
            ListEvent::LocationChanged(self.location.clone()),
            ListEvent::ScrollToTop,
        ]
    }

    pub fn next_page(&mut self) -> Vec<ListEvent> {
        self.set_page(self.page.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> Vec<ListEvent> {
        self.set_page(self.page.current_page.saturating_sub(1))
    }

    /// Applies a change locally. An optimistic delete can empty the last
    /// page, so the page is re-clamped right away.
    pub fn request_mutation(
        &mut self,
        id: RecordId,
        op: MutationOp,
        confirmation: Confirmation,
    ) -> EngineResult<(MutationRequest, Vec<ListEvent>)> {
        let request = self
            .mutations
            .request(&mut self.records, id, op, confirmation)?;
        Ok((request, self.reconcile_page()))
    }

    /// Settles a pending change and re-clamps the page, since a delete can
    /// shrink the page count.
    pub fn settle(
        &mut self,
        id: MutationId,
        outcome: Result<(), String>,
    ) -> (Settlement, Vec<ListEvent>) {
        let settlement = self.mutations.settle(&mut self.records, id, outcome);
        (settlement, self.reconcile_page())
    }

    /// Drops pending changes when the page goes away. Returns how many.
    pub fn unmount(&mut self) -> usize {
        self.mutations.abandon_all()
    }

    fn reset_to_first_page(&mut self) -> Vec<ListEvent> {
        if self.page.current_page == 1 {
            return Vec::new();
        }
        self.page.current_page = 1;
        self.location = self.location.clone().with_page(1);
        vec![
            ListEvent::LocationChanged(self.location.clone()),
            ListEvent::ScrollToTop,
        ]
    }

    fn reconcile_page(&mut self) -> Vec<ListEvent> {
        let clamped = clamp_page(self.page.current_page, self.total_pages());
        if clamped == self.page.current_page {
            return Vec::new();
        }
        tracing::debug!(
            target: "pishkhan::pagination",
            tab = self.tab.route(),
            requested = self.page.current_page,
            clamped,
            "page clamped"
        );
        self.page.current_page = clamped;
        self.location = self.location.clone().with_page(clamped);
        vec![ListEvent::LocationChanged(self.location.clone())]
    }
}
