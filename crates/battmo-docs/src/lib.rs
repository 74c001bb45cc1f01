//! # battmo-docs — Source Links for the BattMo Documentation
//!
//! The documentation refers to MATLAB sources with an inline role:
//!
//! ```text
//! See :battmo:`runBatteryP2D#42` for the setup of the simulation.
//! ```
//!
//! which expands to a link to line 42 of `runBatteryP2D.m` on the
//! configured branch of the repository browser.
//!
//! ## Modules
//!
//! - [`locate`] — finds `<identifier>.m` in the project tree, pruning
//!   build output, vendored frameworks and VCS metadata.
//! - [`link`] — builds `<repo>/blob/<branch>/<path>#L<line>` URLs.
//! - [`role`] — the [`Role`] trait, the [`RoleRegistry`] and the two
//!   roles this crate provides.
//! - [`expand`] — rewrites role occurrences in a text into rendered links.
//!
//! ## Registration
//!
//! Roles are registered explicitly by the host through [`setup`]; loading
//! this crate registers nothing.

pub mod error;
pub mod expand;
pub mod link;
pub mod locate;
pub mod role;

use std::path::Path;

use battmo_core::BattmoConfig;

pub use error::DocsError;
pub use expand::expand_roles;
pub use link::{SourceLinkBuilder, SourceReference};
pub use locate::SourceLocator;
pub use role::{
    unescape, BattmoReferenceRole, ClassRole, InlineNode, Node, ReferenceNode, RenderFormat, Role,
    RoleInvocation, RoleOptions, RoleRegistry,
};

/// Name under which the source-reference role is registered.
pub const BATTMO_ROLE: &str = "battmo";

/// Extension entry point: register every role this crate provides.
///
/// `source_root` is the directory searched for source files.
pub fn setup(
    registry: &mut RoleRegistry,
    config: &BattmoConfig,
    source_root: &Path,
) -> Result<(), DocsError> {
    let role = BattmoReferenceRole::from_config(source_root, &config.source)?;
    registry.register(BATTMO_ROLE, role);

    for (name, class) in &config.docs.class_roles {
        registry.register(name, ClassRole::new(class));
    }

    tracing::debug!(roles = ?registry.names(), "registered documentation roles");
    Ok(())
}
