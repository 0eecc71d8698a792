pub mod evaluator;
pub mod graph_manager;
pub mod override_resolution;
pub mod provenance;
pub mod resolver;
pub mod validator;
pub mod vdom;
pub mod vdom_differ;
pub mod vdom_patcher;

#[cfg(test)]
mod tests_scenarios;

#[cfg(test)]
mod tests_slots;

#[cfg(test)]
mod tests_overrides;

#[cfg(test)]
mod tests_error_recovery;

pub use evaluator::{evaluate_modules, Evaluation, Evaluator, ANONYMOUS_URI};
pub use graph_manager::{GraphManager, RenderSession, RenderUpdate, SessionError};
pub use override_resolution::{OverrideRegistry, ResolvedOverride};
pub use provenance::{InstancePath, Provenance};
pub use resolver::{
    resolve_chain, resolve_target_path, InheritanceChain, ReferenceIndex, Resolution, Resolver,
};
pub use validator::Validator;
pub use vdom::{NodeFlags, NodeKind, VDocument, VElement, VNode, VText};
pub use vdom_differ::{diff_vdocument, Differ, NodePath, Op, Property};
pub use vdom_patcher::{apply_op, patch, PatchError, PatchResult};
