//! Causal violation classification.
//!
//! Every violation produced here carries a [`Proof`]. Anything that cannot be
//! proven from resolved file pairs goes to [`Coverage`] instead.

use crate::coverage::{Coverage, CoverageLoss};
use crate::revision::Revision;
use fence_graph::{is_relative_specifier, public_exports, resolve, ResolutionKind};
use fence_imports::Dialect;
use fence_protocol::{Proof, ProofKind, ProofRule, Violation, ViolationCause, ViolationKey};
use fence_workspace::{ChangeEntry, ChangeStatus, ModuleEntry, Package, RepoPath};
use std::collections::BTreeMap;

/// Package name used for files that belong to no package
pub const ROOT_PACKAGE: &str = "<root>";

#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Deduplicated, ordered by violation key
    pub violations: Vec<Violation>,
    pub coverage: Coverage,
}

#[derive(Default)]
struct Collector {
    violations: BTreeMap<ViolationKey, Violation>,
    coverage: Coverage,
}

impl Collector {
    fn push(&mut self, violation: Violation) {
        let key = violation.key();
        if self.violations.contains_key(&key) {
            return;
        }
        log::debug!("Violation {key}");
        self.violations.insert(key, violation);
    }

    fn finish(self) -> Detection {
        Detection {
            violations: self.violations.into_values().collect(),
            coverage: self.coverage,
        }
    }
}

/// Classify the imports of added and modified files, and public API removed since
/// `base`. Without a base revision deletions are not examined.
pub fn detect(changes: &[ChangeEntry], head: &Revision<'_>, base: Option<&Revision<'_>>) -> Detection {
    let mut collector = Collector::default();

    for change in changes {
        match change.status {
            ChangeStatus::Added | ChangeStatus::Modified => {
                if Dialect::is_source_path(change.path.as_str()) {
                    check_imports(&change.path, head, &mut collector);
                }
            }
            ChangeStatus::Deleted => {
                if let Some(base) = base {
                    check_deleted_file(&change.path, base, &mut collector);
                }
            }
        }
    }

    if let Some(base) = base {
        check_removed_exports(head, base, &mut collector);
    }

    collector.coverage.log_summary();
    collector.finish()
}

struct Import<'s> {
    specifier: &'s str,
    type_only: bool,
}

fn check_imports(path: &RepoPath, head: &Revision<'_>, collector: &mut Collector) {
    collector.coverage.analyzed_files += 1;
    let imports = match head.modules.get(path) {
        Some(ModuleEntry::Parsed(imports)) => imports,
        Some(ModuleEntry::Unreadable) | None => {
            collector.coverage.record(path, None, CoverageLoss::Unreadable);
            return;
        }
        Some(ModuleEntry::ParseFailed(message)) => {
            log::warn!("Failed to parse {path}: {message}");
            collector.coverage.record(path, None, CoverageLoss::ParseFailed);
            return;
        }
    };

    let owner = head.index.package_of(path);
    let value = imports.value_imports.iter().map(|import| Import {
        specifier: &import.specifier,
        type_only: false,
    });
    let types = imports.type_imports.iter().map(|import| Import {
        specifier: &import.specifier,
        type_only: true,
    });
    let reexports = imports.reexports.iter().map(|reexport| Import {
        specifier: &reexport.specifier,
        type_only: reexport.type_only,
    });

    for import in value.chain(types).chain(reexports) {
        check_import(path, owner, &import, head, collector);
    }
}

fn check_import(
    path: &RepoPath,
    owner: Option<&Package>,
    import: &Import<'_>,
    head: &Revision<'_>,
    collector: &mut Collector,
) {
    let target = resolve(path, import.specifier, &head.index);
    let target_path = match (target.kind, target.path) {
        (ResolutionKind::External, _) => return,
        (ResolutionKind::Unresolved, _) => {
            collector
                .coverage
                .record(path, Some(import.specifier), CoverageLoss::Unresolved);
            return;
        }
        (_, None) => {
            collector
                .coverage
                .record(path, Some(import.specifier), CoverageLoss::ForbiddenSpecifier);
            return;
        }
        (_, Some(target_path)) => target_path,
    };

    let owner_name = owner.map(|pkg| pkg.name.as_str());
    let Some(target_pkg) = head
        .index
        .package_of(&target_path)
        .filter(|pkg| Some(pkg.name.as_str()) != owner_name)
    else {
        return;
    };

    if target.kind != ResolutionKind::Forbidden
        && target_path.is_inside(&target_pkg.src_dir)
        && !head.surfaces.is_public(&target_pkg.name, &target_path)
    {
        let (cause, rule) = if import.type_only {
            (ViolationCause::TypeImportPrivateTarget, ProofRule::TypeTargetOutsidePublicSurface)
        } else {
            (ViolationCause::BoundaryViolation, ProofRule::TargetOutsidePublicSurface)
        };
        collector.push(import_violation(path, owner_name, import, &target_path, cause, rule));
        return;
    }

    if is_relative_specifier(import.specifier) {
        collector.push(import_violation(
            path,
            owner_name,
            import,
            &target_path,
            ViolationCause::RelativeEscape,
            ProofRule::RelativeSpecifierCrossesPackage,
        ));
    }
}

fn import_violation(
    path: &RepoPath,
    owner: Option<&str>,
    import: &Import<'_>,
    target: &RepoPath,
    cause: ViolationCause,
    rule: ProofRule,
) -> Violation {
    Violation {
        package: owner.unwrap_or(ROOT_PACKAGE).to_string(),
        path: path.to_string(),
        cause,
        specifier: Some(import.specifier.to_string()),
        proof: Some(Proof {
            kind: ProofKind::ResolvedImport,
            source: path.to_string(),
            target: target.to_string(),
            rule,
        }),
    }
}

/// A deleted file that belonged to its package's public surface at base
fn check_deleted_file(path: &RepoPath, base: &Revision<'_>, collector: &mut Collector) {
    let Some(package) = base.index.package_of(path) else {
        return;
    };
    if !base.surfaces.is_public(&package.name, path) {
        return;
    }
    let Some(entry) = &package.entry else {
        return;
    };

    collector.push(Violation {
        package: package.name.clone(),
        path: path.to_string(),
        cause: ViolationCause::DeletedPublicApi,
        specifier: None,
        proof: Some(Proof {
            kind: ProofKind::PublicSurfaceMembership,
            source: entry.to_string(),
            target: path.to_string(),
            rule: ProofRule::DeletedPublicFile,
        }),
    });
}

/// Export names published at base that the head entry no longer publishes.
///
/// Names of files deleted since base are left to [`check_deleted_file`].
fn check_removed_exports(head: &Revision<'_>, base: &Revision<'_>, collector: &mut Collector) {
    for base_pkg in base.index.packages() {
        let (Some(base_surface), Some(head_surface), Some(head_pkg), Some(entry)) = (
            base.surfaces.get(&base_pkg.name),
            head.surfaces.get(&base_pkg.name),
            head.index.package(&base_pkg.name),
            base_pkg.entry.as_ref(),
        ) else {
            continue;
        };

        // A name may have moved into a head file we cannot read in full
        if let Some((unusable, loss)) = head_surface.iter().find_map(|file| {
            match head.modules.imports(file) {
                None => Some((file, CoverageLoss::Unreadable)),
                Some(imports) if imports.had_errors => Some((file, CoverageLoss::ParseFailed)),
                Some(_) => None,
            }
        }) {
            collector.coverage.record(unusable, None, loss);
            continue;
        }

        let before = public_exports(base_pkg, base_surface, &base.modules, &base.index);
        let after = public_exports(head_pkg, head_surface, &head.modules, &head.index);
        for (name, file) in before {
            if after.contains_key(&name) || !head.tree().contains(&file) {
                continue;
            }
            collector.push(Violation {
                package: base_pkg.name.clone(),
                path: file.to_string(),
                cause: ViolationCause::DeletedPublicApi,
                specifier: Some(name),
                proof: Some(Proof {
                    kind: ProofKind::PublicSurfaceMembership,
                    source: entry.to_string(),
                    target: file.to_string(),
                    rule: ProofRule::RemovedPublicExport,
                }),
            });
        }
    }
}
