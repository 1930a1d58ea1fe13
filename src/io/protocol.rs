//! Writer protocol: the state machine guarding sink call ordering.
//!
//! `Idle → StepOpen → GeometryOpen → GeometryClosed → FieldsOpen* →
//! StepClosed → …`. Violations are caller bugs and surface as fatal
//! `ProtocolViolation` errors; nothing is retried.

use hashbrown::HashSet;
use log::debug;

use crate::algs::tesselate::{tesselate, FieldSpec};
use crate::data::patch::Patch;
use crate::io::sink::{Sink, ValueKind};
use crate::io::{FieldInfo, FieldKind, StepMeta};
use crate::mesh_error::MeshTesselateError;
use crate::topology::manager::{Emission, GeometryManager};

/// Protocol states, in legal transition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    Idle,
    StepOpen,
    GeometryOpen,
    GeometryClosed,
    FieldsOpen,
    StepClosed,
}

/// Enforces the writer protocol over a sink, routing geometry through the
/// geometry manager so repeated topology is never re-emitted.
#[derive(Debug)]
pub struct Protocol<S: Sink> {
    sink: S,
    manager: GeometryManager,
    state: WriterState,
    steps_begun: usize,
    emitted_this_step: HashSet<usize>,
}

impl<S: Sink> Protocol<S> {
    /// Wrap a sink, using `manager` for global patch numbering.
    pub fn new(sink: S, manager: GeometryManager) -> Self {
        Self {
            sink,
            manager,
            state: WriterState::Idle,
            steps_begun: 0,
            emitted_this_step: HashSet::new(),
        }
    }

    /// Current protocol state.
    #[inline]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Number of steps opened so far.
    #[inline]
    pub fn steps_begun(&self) -> usize {
        self.steps_begun
    }

    /// Read access to the geometry manager.
    #[inline]
    pub fn manager(&self) -> &GeometryManager {
        &self.manager
    }

    /// Shared access to the wrapped sink.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap the sink after the run.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn violation(&self, what: &str) -> MeshTesselateError {
        MeshTesselateError::ProtocolViolation(format!(
            "{what} in state {:?}",
            self.state
        ))
    }

    /// Open the next output step.
    pub fn begin_step(&mut self, meta: StepMeta) -> Result<(), MeshTesselateError> {
        if !matches!(self.state, WriterState::Idle | WriterState::StepClosed) {
            return Err(self.violation("begin_step"));
        }
        let step = self.steps_begun;
        self.steps_begun += 1;
        self.emitted_this_step.clear();
        self.sink.begin_step(step, meta)?;
        self.state = WriterState::StepOpen;
        Ok(())
    }

    /// Resolve `patch` at source timestep `step` and forward its geometry
    /// when it is not already current downstream. Returns the stable
    /// global patch ID either way.
    pub fn update_geometry(
        &mut self,
        patch: &Patch,
        step: usize,
    ) -> Result<usize, MeshTesselateError> {
        if !matches!(
            self.state,
            WriterState::StepOpen | WriterState::GeometryOpen
        ) {
            return Err(self.violation("update_geometry"));
        }
        let emission = self.manager.maybe_emit(patch, step)?;
        let id = emission.id();
        if !self.emitted_this_step.insert(id) {
            return Err(MeshTesselateError::ProtocolViolation(format!(
                "patch {id} updated twice within one step"
            )));
        }
        if let Emission::Emitted {
            id,
            nodes,
            elements,
        } = emission
        {
            self.sink.geometry(id, &nodes, &elements)?;
        }
        self.state = WriterState::GeometryOpen;
        Ok(id)
    }

    /// Close the geometry phase of the current step. A no-op when no
    /// geometry was dirty; idempotent.
    pub fn finalize_geometry(&mut self) -> Result<(), MeshTesselateError> {
        match self.state {
            WriterState::GeometryOpen => {
                self.sink.finalize_geometry()?;
                self.state = WriterState::GeometryClosed;
                Ok(())
            }
            WriterState::StepOpen => {
                self.state = WriterState::GeometryClosed;
                Ok(())
            }
            WriterState::GeometryClosed => Ok(()),
            _ => Err(self.violation("finalize_geometry")),
        }
    }

    /// Evaluate a field on `patch` at the patch's established tesselation
    /// schedule and forward the values, plus one scalar update per
    /// component for multi-component fields.
    pub fn update_field(
        &mut self,
        field: &FieldInfo,
        patch: &Patch,
        coeffs: &[f64],
    ) -> Result<(), MeshTesselateError> {
        if !matches!(
            self.state,
            WriterState::GeometryClosed | WriterState::FieldsOpen
        ) {
            return Err(self.violation("update_field"));
        }
        let (id, schedule) = self.manager.field_schedule(patch)?;
        let cells = field.kind == FieldKind::Cell;
        let spec = FieldSpec {
            coeffs,
            as_cells: cells,
            vectorize: field.kind == FieldKind::Eigenmode,
        };
        let result = tesselate(patch, &schedule, Some(spec))?;
        let values = result
            .field
            .ok_or_else(|| MeshTesselateError::External("field evaluation missing".into()))?;
        let kind = if values.ncomps > 1 {
            ValueKind::Vector
        } else {
            ValueKind::Scalar
        };
        debug!(
            "updating field {} on patch {id} ({} values x {} components)",
            field.name,
            values.len(),
            values.ncomps
        );
        self.sink
            .field(&field.name, id, &values.values, kind, cells)?;
        if field.ncomps > 1 {
            for c in 0..field.ncomps.min(values.ncomps) {
                let name = format!("{}[{}]", field.name, c + 1);
                self.sink
                    .field(&name, id, &values.component(c), ValueKind::Scalar, cells)?;
            }
        }
        self.state = WriterState::FieldsOpen;
        Ok(())
    }

    /// Close the current step. Requires geometry to have been finalized.
    pub fn finalize_step(&mut self) -> Result<(), MeshTesselateError> {
        match self.state {
            WriterState::GeometryClosed | WriterState::FieldsOpen => {
                self.sink.finalize_step()?;
                self.state = WriterState::StepClosed;
                Ok(())
            }
            WriterState::GeometryOpen => {
                Err(self.violation("finalize_step with pending geometry"))
            }
            _ => Err(self.violation("finalize_step")),
        }
    }
}
