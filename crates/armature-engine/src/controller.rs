//! Controller built from a pair of user callbacks.
//!
//! The command callback produces the motor torques, the internal
//! dynamics callback produces joint-space torques applied regardless
//! of the command hold (spring returns, model-side compensation). Both
//! write into engine-owned buffers, so a controller never allocates in
//! the control path.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use nalgebra::DVector;

use armature_core::ConfigNode;

use crate::error::{ModelError, SimulatorError};
use crate::model::Model;
use crate::options::ControllerOptions;

/// Callback signature shared by the command and the internal dynamics.
pub type ControlCallback = dyn FnMut(f64, &DVector<f64>, &DVector<f64>, &mut DVector<f64>);

/// A controller wrapping two infallible callbacks.
pub struct ControllerFunctor {
    command: Box<ControlCallback>,
    internal_dynamics: Box<ControlCallback>,
    /// `(nu, nv)` once bound to a model.
    dims: Option<(usize, usize)>,
    u_command: DVector<f64>,
    u_internal: DVector<f64>,
    entries: Vec<(String, Rc<Cell<f64>>)>,
    options: ControllerOptions,
}

impl ControllerFunctor {
    /// Wrap a command callback and an internal-dynamics callback.
    ///
    /// Both receive `(t, q, v, u)` and write into `u`: the command
    /// buffer has one entry per motor, the internal-dynamics buffer one
    /// entry per velocity coordinate. Buffers are zeroed before each
    /// call.
    pub fn new<C, D>(command: C, internal_dynamics: D) -> Self
    where
        C: FnMut(f64, &DVector<f64>, &DVector<f64>, &mut DVector<f64>) + 'static,
        D: FnMut(f64, &DVector<f64>, &DVector<f64>, &mut DVector<f64>) + 'static,
    {
        Self {
            command: Box::new(command),
            internal_dynamics: Box::new(internal_dynamics),
            dims: None,
            u_command: DVector::zeros(0),
            u_internal: DVector::zeros(0),
            entries: Vec::new(),
            options: ControllerOptions::default(),
        }
    }

    /// Bind the buffer sizes to an initialized model.
    pub fn initialize(&mut self, model: &Model) -> Result<(), ModelError> {
        if !model.is_initialized() {
            return Err(ModelError::NotInitialized);
        }
        let nu = model.nu();
        let nv = model.nv();
        self.dims = Some((nu, nv));
        self.u_command = DVector::zeros(nu);
        self.u_internal = DVector::zeros(nv);
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.dims.is_some()
    }

    /// Buffer sizes `(nu, nv)` the controller is bound to.
    pub fn dims(&self) -> Option<(usize, usize)> {
        self.dims
    }

    /// Register one telemetry entry sampled at every recorded row.
    ///
    /// The controller-side code keeps the `Rc<Cell<f64>>` and updates
    /// it from inside its callbacks; the simulator reads it when a row
    /// is recorded.
    pub fn register_entry(
        &mut self,
        name: &str,
        handle: Rc<Cell<f64>>,
    ) -> Result<(), SimulatorError> {
        if self.entries.iter().any(|(n, _)| n == name) {
            return Err(SimulatorError::DuplicateEntry {
                name: name.to_string(),
            });
        }
        self.entries.push((name.to_string(), handle));
        Ok(())
    }

    /// Register several telemetry entries, pairing names with handles.
    pub fn register_entries<'a, I>(&mut self, entries: I) -> Result<(), SimulatorError>
    where
        I: IntoIterator<Item = (&'a str, Rc<Cell<f64>>)>,
    {
        for (name, handle) in entries {
            self.register_entry(name, handle)?;
        }
        Ok(())
    }

    /// Drop every registered telemetry entry.
    pub fn remove_entries(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn entries(&self) -> &[(String, Rc<Cell<f64>>)] {
        &self.entries
    }

    /// Evaluate the command callback into the motor-torque buffer.
    pub(crate) fn compute_command(
        &mut self,
        t: f64,
        q: &DVector<f64>,
        v: &DVector<f64>,
    ) -> &DVector<f64> {
        self.u_command.fill(0.0);
        (self.command)(t, q, v, &mut self.u_command);
        &self.u_command
    }

    /// Evaluate the internal-dynamics callback into the joint-torque buffer.
    pub(crate) fn compute_internal_dynamics(
        &mut self,
        t: f64,
        q: &DVector<f64>,
        v: &DVector<f64>,
    ) -> &DVector<f64> {
        self.u_internal.fill(0.0);
        (self.internal_dynamics)(t, q, v, &mut self.u_internal);
        &self.u_internal
    }

    /// Current controller options as a tree.
    pub fn controller_options(&self) -> ConfigNode {
        self.options.to_node()
    }

    /// Replace the controller options from a tree.
    pub fn set_controller_options(&mut self, node: &ConfigNode) -> Result<(), ModelError> {
        self.options = ControllerOptions::from_node(node)?;
        Ok(())
    }

    pub(crate) fn options(&self) -> &ControllerOptions {
        &self.options
    }
}

impl fmt::Debug for ControllerFunctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerFunctor")
            .field("dims", &self.dims)
            .field(
                "entries",
                &self.entries.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ── Tests ──────────────────────────────────────────────────────────
