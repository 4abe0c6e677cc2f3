// crates/harvest-transform-core/src/runtime/links.rs
// ============================================================================
// Module: Link Graph Rewriter
// Description: Rewrites every link and asset href onto the target root.
// Purpose: Reproduce nested catalog structure under the new canonical root.
// Dependencies: crate::core, crate::interfaces, serde_json, url
// ============================================================================

//! ## Overview
//! The rewriter walks the whole parsed tree, visiting every `links` array and
//! `assets` map (including ones nested inside `summaries` substructures), and
//! maps each in-tree href onto the target root via key arithmetic. Each
//! document is treated independently. Ancestor links form cycles across the
//! harvested tree, so no global traversal happens; path-prefix arithmetic
//! alone decides where an href lands.
//! Invariants:
//! - Hrefs already under the target root pass through unchanged, which makes
//!   a second rewrite pass a no-op (idempotence).
//! - `rel=self` is always forced to the document's own new href; `rel=root`
//!   to the batch root's new href; exactly one of each survives.
//! - External hrefs (other catalogues, license pages, build scripts) are
//!   never touched.
//! - A single malformed href degrades to a warning, never an abort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;
use url::Url;

use crate::core::context::TransformContext;
use crate::core::context::trim_key;
use crate::core::keys::KeyError;
use crate::core::keys::has_scheme;
use crate::core::keys::is_under_root;
use crate::core::keys::resolve_href;
use crate::core::keys::resolve_relative;
use crate::core::outcome::TransformWarning;
use crate::interfaces::LicenseIndex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Link relation naming the harvester's source API conformance classes.
const REL_CONFORMANCE: &str = "conformance";

/// Top-level member carrying source API conformance classes.
const CONFORMS_TO: &str = "conformsTo";

// ============================================================================
// SECTION: Link Rewriter
// ============================================================================

/// Rewrites one document's link graph onto the target root.
///
/// # Invariants
/// - Holds no mutable state; safe to drop after one document.
pub(crate) struct LinkRewriter<'run> {
    /// Per-batch transformation context.
    ctx: &'run TransformContext,
    /// Original key of the document being rewritten.
    original_key: &'run str,
    /// The document's own new absolute href.
    self_href: String,
    /// The batch root's new absolute href.
    root_href: String,
    /// License index capability for `rel=license` routing.
    license: &'run dyn LicenseIndex,
}

impl<'run> LinkRewriter<'run> {
    /// Builds a rewriter for one document, resolving its new hrefs up front.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the document or batch-root key cannot be
    /// mapped under the target root.
    pub(crate) fn new(
        ctx: &'run TransformContext,
        original_key: &'run str,
        license: &'run dyn LicenseIndex,
    ) -> Result<Self, KeyError> {
        let self_href = resolve_href(original_key, ctx)?;
        let root_href = resolve_href(&ctx.root_key(), ctx)?;
        Ok(Self {
            ctx,
            original_key,
            self_href,
            root_href,
            license,
        })
    }

    /// Rewrites every link and asset href in the document.
    pub(crate) fn rewrite(&self, value: &mut Value, warnings: &mut Vec<TransformWarning>) {
        if let Some(map) = value.as_object_mut() {
            // Conformance classes describe the source API and are meaningless
            // once detached from it.
            map.remove(CONFORMS_TO);
        }
        self.rewrite_node(value, warnings);
        self.finalize_links(value, warnings);
    }

    /// Recursively rewrites `links` arrays and `assets` maps in a subtree.
    fn rewrite_node(&self, node: &mut Value, warnings: &mut Vec<TransformWarning>) {
        match node {
            Value::Array(items) => {
                for item in items {
                    self.rewrite_node(item, warnings);
                }
            }
            Value::Object(map) => {
                if let Some(Value::Array(links)) = map.get_mut("links") {
                    links.retain(|link| link_rel(link) != Some(REL_CONFORMANCE));
                    for link in links {
                        self.rewrite_link(link, warnings);
                    }
                }
                if let Some(Value::Object(assets)) = map.get_mut("assets") {
                    for asset in assets.values_mut() {
                        self.rewrite_asset(asset, warnings);
                    }
                }
                for child in map.values_mut() {
                    self.rewrite_node(child, warnings);
                }
            }
            _ => {}
        }
    }

    /// Rewrites one link object's href in place.
    fn rewrite_link(&self, link: &mut Value, warnings: &mut Vec<TransformWarning>) {
        let Some(href) = link.get("href").and_then(Value::as_str).map(str::to_string) else {
            warnings.push(TransformWarning::LinkRewrite {
                href: String::new(),
                detail: "link has no string href".to_string(),
            });
            return;
        };
        match self.rewrite_href(&href) {
            Ok(Some(rewritten)) => {
                if let Some(map) = link.as_object_mut() {
                    map.insert("href".to_string(), Value::String(rewritten));
                }
            }
            Ok(None) => {}
            Err(detail) => warnings.push(TransformWarning::LinkRewrite {
                href,
                detail,
            }),
        }
    }

    /// Rewrites one asset's href when it falls under the source tree.
    ///
    /// Assets routinely reference content outside the catalogue tree (build
    /// scripts, thumbnails on other hosts); those pass through untouched.
    fn rewrite_asset(&self, asset: &mut Value, warnings: &mut Vec<TransformWarning>) {
        let Some(href) = asset.get("href").and_then(Value::as_str).map(str::to_string) else {
            return;
        };
        if has_scheme(&href) && !href.starts_with(self.ctx.target_root_str()) {
            return;
        }
        match self.rewrite_href(&href) {
            Ok(Some(rewritten)) => {
                if let Some(map) = asset.as_object_mut() {
                    map.insert("href".to_string(), Value::String(rewritten));
                }
            }
            Ok(None) => {}
            Err(detail) => warnings.push(TransformWarning::LinkRewrite {
                href,
                detail,
            }),
        }
    }

    /// Computes the new form of an href, if it needs one.
    ///
    /// Returns `Ok(None)` for hrefs that must pass through unchanged (already
    /// rewritten, or external) and `Err` with a detail string for a malformed
    /// href that must be left alone with a warning.
    fn rewrite_href(&self, href: &str) -> Result<Option<String>, String> {
        if href.starts_with(self.ctx.target_root_str()) {
            // Already an href under the new root: second passes recompute
            // nothing, which is what makes rewriting idempotent.
            return Ok(None);
        }
        if has_scheme(href) {
            // Absolute link outside the tree. Assume a valid external
            // reference and pass it through.
            return Ok(None);
        }
        let source_root = self.ctx.source_root();
        let candidate = if is_under_root(trim_key(href), source_root) {
            trim_key(href).to_string()
        } else {
            resolve_relative(self.original_key, href)
        };
        if is_under_root(&candidate, source_root) {
            let rewritten =
                resolve_href(&candidate, self.ctx).map_err(|err| err.to_string())?;
            return Ok(Some(rewritten));
        }
        // Relative href escaping the source tree: re-emit absolute against
        // the document's own new location.
        let base = Url::parse(&self.self_href).map_err(|err| err.to_string())?;
        let joined = base.join(href).map_err(|err| err.to_string())?;
        Ok(Some(joined.to_string()))
    }

    // ------------------------------------------------------------------
    // Top-level link invariants
    // ------------------------------------------------------------------

    /// Enforces the self/root/parent/license invariants on top-level links.
    fn finalize_links(&self, value: &mut Value, warnings: &mut Vec<TransformWarning>) {
        let spdx_id = value.get("license").and_then(Value::as_str).map(str::to_string);
        let Some(map) = value.as_object_mut() else {
            return;
        };
        let links = map.entry("links").or_insert_with(|| Value::Array(Vec::new()));
        if !links.is_array() {
            // A single bare link object appears in some harvested documents.
            let wrapped = if links.is_object() { vec![links.take()] } else { Vec::new() };
            *links = Value::Array(wrapped);
        }
        let Some(items) = links.as_array_mut() else {
            return;
        };
        force_unique_rel(items, "self", &self.self_href);
        force_unique_rel(items, "root", &self.root_href);
        self.fix_parent_links(items);
        if let Some(spdx_id) = spdx_id {
            self.route_license_links(items, &spdx_id, warnings);
        }
    }

    /// Points dangling parent links at the parent of the self href.
    fn fix_parent_links(&self, items: &mut [Value]) {
        let Some(parent_href) = parent_of(&self.self_href) else {
            return;
        };
        for link in items.iter_mut() {
            if link_rel(link) != Some("parent") {
                continue;
            }
            let in_tree = link
                .get("href")
                .and_then(Value::as_str)
                .is_some_and(|href| href.starts_with(self.ctx.target_root_str()));
            if !in_tree && let Some(map) = link.as_object_mut() {
                map.insert("href".to_string(), Value::String(parent_href.clone()));
            }
        }
    }

    /// Replaces license link hrefs with the canonical license-file location.
    ///
    /// Misses and index failures leave the link unchanged and record a
    /// warning; license correctness never blocks the document.
    fn route_license_links(
        &self,
        items: &mut [Value],
        spdx_id: &str,
        warnings: &mut Vec<TransformWarning>,
    ) {
        if spdx_id.is_empty() || !items.iter().any(|link| link_rel(link) == Some("license")) {
            return;
        }
        let resolved = match self.license.resolve(spdx_id) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                warnings.push(TransformWarning::LicenseResolution {
                    spdx_id: spdx_id.to_string(),
                    detail: "no canonical license file in index".to_string(),
                });
                return;
            }
            Err(err) => {
                warnings.push(TransformWarning::LicenseResolution {
                    spdx_id: spdx_id.to_string(),
                    detail: err.to_string(),
                });
                return;
            }
        };
        for link in items.iter_mut() {
            if link_rel(link) != Some("license") {
                continue;
            }
            if let Some(map) = link.as_object_mut() {
                map.insert("href".to_string(), Value::String(resolved.href.clone()));
                if let Some(media_type) = &resolved.media_type {
                    map.insert("type".to_string(), Value::String(media_type.clone()));
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Link Array Helpers
// ============================================================================

/// Reads a link object's relation, when present as a string.
fn link_rel(link: &Value) -> Option<&str> {
    link.get("rel").and_then(Value::as_str)
}

/// Forces exactly one link with the relation, pointing at the href.
///
/// The first matching link keeps its other members; later duplicates are
/// dropped; a missing link is appended.
fn force_unique_rel(items: &mut Vec<Value>, rel: &str, href: &str) {
    let mut seen = false;
    items.retain_mut(|link| {
        if link_rel(link) != Some(rel) {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        if let Some(map) = link.as_object_mut() {
            map.insert("href".to_string(), Value::String(href.to_string()));
        }
        true
    });
    if !seen {
        items.push(json!({
            "rel": rel,
            "type": "application/json",
            "href": href,
        }));
    }
}

/// Returns the href two segments above a document href, when one exists.
fn parent_of(self_href: &str) -> Option<String> {
    let (rest, _file) = self_href.rsplit_once('/')?;
    let (parent, _dir) = rest.rsplit_once('/')?;
    if parent.ends_with(':') || parent.ends_with('/') {
        return None;
    }
    Some(parent.to_string())
}
