//! Chart lifecycle: at most one live chart handle per column.
//!
//! Replacing a column's chart always releases the old instance before the backend is
//! asked for a new one, so repeated re-renders never accumulate live instances.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::chart::ChartSpec;
use crate::error::RenderError;
use crate::render::{ChartBackend, ChartInstance, RenderTarget, Theme};

/// Observable per-column state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Never rendered, or the last render attempt failed.
    Absent,
    Rendered,
    /// Released by a dashboard rebuild or teardown.
    Destroyed,
}

/// The live rendering instance for one column.
pub struct ChartHandle {
    column: String,
    generation: u64,
    instance: Box<dyn ChartInstance>,
}

impl ChartHandle {
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Increases every time any column's chart is (re)created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn instance(&self) -> &dyn ChartInstance {
        self.instance.as_ref()
    }

    pub fn spec(&self) -> &ChartSpec {
        self.instance.spec()
    }

    fn release(mut self) {
        debug!(
            column = %self.column,
            generation = self.generation,
            target = self.instance.target_id(),
            "destroying chart"
        );
        self.instance.destroy();
    }
}

impl std::fmt::Debug for ChartHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartHandle")
            .field("column", &self.column)
            .field("generation", &self.generation)
            .field("target", &self.instance.target_id())
            .field("live", &self.instance.is_live())
            .finish()
    }
}

/// Owns the handle table and the backend that creates chart instances.
pub struct ChartRegistry {
    backend: Box<dyn ChartBackend>,
    handles: HashMap<String, ChartHandle>,
    released: HashSet<String>,
    next_generation: u64,
}

impl ChartRegistry {
    pub fn new(backend: Box<dyn ChartBackend>) -> Self {
        Self {
            backend,
            handles: HashMap::new(),
            released: HashSet::new(),
            next_generation: 1,
        }
    }

    /// Replaces the chart for `column`: the existing handle (if any) is released first,
    /// then a new instance is created. On failure the column has no handle.
    pub fn replace(
        &mut self,
        column: &str,
        target: &RenderTarget,
        spec: &ChartSpec,
        theme: &Theme,
    ) -> Result<&ChartHandle, RenderError> {
        if let Some(old) = self.handles.remove(column) {
            old.release();
        }
        self.released.remove(column);

        let instance = match self.backend.create(target, spec, theme) {
            Ok(instance) => instance,
            Err(err) => {
                warn!(column, target = %target.id, error = %err, "chart render failed");
                return Err(err);
            }
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        debug!(
            column,
            generation,
            target = %target.id,
            kind = %spec.kind,
            width = target.width,
            height = target.height,
            "created chart"
        );
        let handle = ChartHandle {
            column: column.to_string(),
            generation,
            instance,
        };
        // The old entry was removed above, so this always inserts.
        Ok(self.handles.entry(column.to_string()).or_insert(handle))
    }

    /// Releases the handle for `column`, if any. Returns whether one was live.
    pub fn release(&mut self, column: &str) -> bool {
        match self.handles.remove(column) {
            Some(handle) => {
                handle.release();
                self.released.insert(column.to_string());
                true
            }
            None => false,
        }
    }

    /// Releases every handle.
    pub fn release_all(&mut self) {
        let columns: Vec<String> = self.handles.keys().cloned().collect();
        for column in columns {
            self.release(&column);
        }
    }

    /// Drops the record of released columns so they read as `Absent` again.
    pub fn forget_released(&mut self) {
        self.released.clear();
    }

    pub fn get(&self, column: &str) -> Option<&ChartHandle> {
        self.handles.get(column)
    }

    pub fn state(&self, column: &str) -> HandleState {
        if self.handles.contains_key(column) {
            HandleState::Rendered
        } else if self.released.contains(column) {
            HandleState::Destroyed
        } else {
            HandleState::Absent
        }
    }

    /// Number of live instances held.
    pub fn live_count(&self) -> usize {
        self.handles
            .values()
            .filter(|h| h.instance.is_live())
            .count()
    }
}

impl Drop for ChartRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::chart_data::Series;
    use std::cell::Cell as Counter;
    use std::rc::Rc;

    /// Backend whose instances track how many are alive at once.
    struct CountingBackend {
        live: Rc<Counter<usize>>,
        fail: bool,
    }

    struct CountingChart {
        id: String,
        spec: ChartSpec,
        live: Rc<Counter<usize>>,
        alive: bool,
    }

    impl ChartBackend for CountingBackend {
        fn create(
            &mut self,
            target: &RenderTarget,
            spec: &ChartSpec,
            _theme: &Theme,
        ) -> Result<Box<dyn ChartInstance>, RenderError> {
            if self.fail {
                return Err(RenderError::Backend("boom".into()));
            }
            self.live.set(self.live.get() + 1);
            Ok(Box::new(CountingChart {
                id: target.id.clone(),
                spec: spec.clone(),
                live: Rc::clone(&self.live),
                alive: true,
            }))
        }
    }

    impl ChartInstance for CountingChart {
        fn target_id(&self) -> &str {
            &self.id
        }
        fn spec(&self) -> &ChartSpec {
            &self.spec
        }
        fn size(&self) -> (u32, u32) {
            (1, 1)
        }
        fn destroy(&mut self) {
            if self.alive {
                self.alive = false;
                self.live.set(self.live.get() - 1);
            }
        }
        fn is_live(&self) -> bool {
            self.alive
        }
        fn to_png(&self) -> Result<Vec<u8>, RenderError> {
            Ok(Vec::new())
        }
        fn to_eps(&self) -> Result<Vec<u8>, RenderError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> (ChartRegistry, Rc<Counter<usize>>) {
        let live = Rc::new(Counter::new(0));
        let backend = CountingBackend {
            live: Rc::clone(&live),
            fail: false,
        };
        (ChartRegistry::new(Box::new(backend)), live)
    }

    fn spec(column: &str, kind: ChartKind) -> ChartSpec {
        let series = Series {
            labels: vec!["a".into()],
            values: vec![1.0],
        };
        ChartSpec::build(column, kind, &series)
    }

    #[test]
    fn repeated_renders_leave_one_live_handle() {
        let (mut registry, live) = registry();
        let target = RenderTarget::for_column("age", 10, 10);
        let mut last = 0;
        for kind in [ChartKind::Bar, ChartKind::Pie, ChartKind::Line, ChartKind::Bar] {
            let generation = registry
                .replace("age", &target, &spec("age", kind), &Theme::LIGHT)
                .unwrap()
                .generation();
            assert!(generation > last);
            last = generation;
            assert_eq!(live.get(), 1);
            assert_eq!(registry.live_count(), 1);
        }
        assert_eq!(registry.get("age").unwrap().spec().kind, ChartKind::Bar);
        assert_eq!(registry.state("age"), HandleState::Rendered);
    }

    #[test]
    fn release_and_state_transitions() {
        let (mut registry, live) = registry();
        assert_eq!(registry.state("age"), HandleState::Absent);
        let target = RenderTarget::for_column("age", 10, 10);
        registry
            .replace("age", &target, &spec("age", ChartKind::Bar), &Theme::LIGHT)
            .unwrap();
        assert!(registry.release("age"));
        assert!(!registry.release("age"));
        assert_eq!(registry.state("age"), HandleState::Destroyed);
        assert_eq!(live.get(), 0);
        registry.forget_released();
        assert_eq!(registry.state("age"), HandleState::Absent);
    }

    #[test]
    fn failed_render_leaves_no_handle() {
        let live = Rc::new(Counter::new(0));
        let mut registry = ChartRegistry::new(Box::new(CountingBackend {
            live: Rc::clone(&live),
            fail: true,
        }));
        let target = RenderTarget::for_column("age", 10, 10);
        let err = registry
            .replace("age", &target, &spec("age", ChartKind::Bar), &Theme::LIGHT)
            .unwrap_err();
        assert_eq!(err, RenderError::Backend("boom".into()));
        assert!(registry.get("age").is_none());
        assert_eq!(registry.state("age"), HandleState::Absent);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn drop_releases_everything() {
        let (mut registry, live) = registry();
        for column in ["a", "b", "c"] {
            let target = RenderTarget::for_column(column, 10, 10);
            registry
                .replace(column, &target, &spec(column, ChartKind::Bar), &Theme::LIGHT)
                .unwrap();
        }
        assert_eq!(live.get(), 3);
        drop(registry);
        assert_eq!(live.get(), 0);
    }
}
