//! Static catalogs of migrations and additions, and selection by version.

use semver::Version;

use crate::codemod::ScriptRef;
use crate::error::CatalogError;

#[derive(Clone, Copy)]
pub struct MigrationDescriptor {
    pub key: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub script: ScriptRef,
}

impl std::fmt::Debug for MigrationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationDescriptor")
            .field("key", &self.key)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
pub struct AdditionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub script: ScriptRef,
    /// Project feature flag switched on once the addition has been applied.
    pub feature_flag: Option<&'static str>,
}

impl std::fmt::Debug for AdditionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdditionDescriptor")
            .field("name", &self.name)
            .field("feature_flag", &self.feature_flag)
            .finish_non_exhaustive()
    }
}

/// Parse a version the way users and config files write them: surrounding
/// whitespace and a leading `v` are tolerated.
pub fn parse_version(version: &str) -> Result<Version, CatalogError> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).map_err(|source| CatalogError::InvalidVersion {
        version: version.to_string(),
        source,
    })
}

/// Migrations with `from <= version <= to`, ascending. Entries sharing a
/// version keep their catalog order.
pub fn select_range<'a>(
    catalog: &'a [MigrationDescriptor],
    from: &str,
    to: &str,
) -> Result<Vec<&'a MigrationDescriptor>, CatalogError> {
    let from = parse_version(from)?;
    let to = parse_version(to)?;

    let mut selected = Vec::new();
    for migration in catalog {
        let version = parse_version(migration.version)?;
        if version >= from && version <= to {
            selected.push((version, migration));
        }
    }
    selected.sort_by(|(a, _), (b, _)| a.cmp_precedence(b));

    Ok(selected.into_iter().map(|(_, m)| m).collect())
}

pub fn find_migration<'a>(
    catalog: &'a [MigrationDescriptor],
    key: &str,
) -> Result<&'a MigrationDescriptor, CatalogError> {
    catalog
        .iter()
        .find(|m| m.key == key)
        .ok_or_else(|| CatalogError::UnknownMigration {
            key: key.to_string(),
            available: catalog.iter().map(|m| m.key.to_string()).collect(),
        })
}

pub fn find_addition<'a>(
    additions: &'a [AdditionDescriptor],
    name: &str,
) -> Result<&'a AdditionDescriptor, CatalogError> {
    additions
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| CatalogError::UnknownAddition {
            name: name.to_string(),
            available: additions.iter().map(|a| a.name.to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codemod::Codemod;
    use crate::context::Context;
    use crate::schema::CodemodOptions;

    struct Noop;

    impl Codemod for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn run(&self, ctx: Context, _options: &CodemodOptions) -> anyhow::Result<Context> {
            Ok(ctx)
        }
    }

    fn noop() -> Box<dyn Codemod> {
        Box::new(Noop)
    }

    const fn migration(key: &'static str, version: &'static str) -> MigrationDescriptor {
        MigrationDescriptor {
            key,
            version,
            description: "",
            script: noop,
        }
    }

    static CATALOG: &[MigrationDescriptor] = &[
        migration("a", "1.0.0"),
        migration("c", "2.0.0"),
        migration("b", "1.2.0"),
        migration("b2", "1.2.0"),
    ];

    fn keys(selected: Vec<&MigrationDescriptor>) -> Vec<&'static str> {
        selected.into_iter().map(|m| m.key).collect()
    }

    #[test]
    fn selects_inclusive_range_in_version_order() {
        assert_eq!(keys(select_range(CATALOG, "1.0.0", "1.5.0").unwrap()), vec!["a", "b", "b2"]);
        assert_eq!(
            keys(select_range(CATALOG, "0.1.0", "v2.0.0").unwrap()),
            vec!["a", "b", "b2", "c"]
        );
        assert!(select_range(CATALOG, "2.0.1", "3.0.0").unwrap().is_empty());
    }

    #[test]
    fn empty_when_from_is_after_to() {
        assert!(select_range(CATALOG, "2.0.0", "1.0.0").unwrap().is_empty());
    }

    #[test]
    fn rejects_unparsable_versions() {
        let err = select_range(CATALOG, "n/a", "1.0.0").unwrap_err();
        assert_eq!(err.to_string(), "Invalid version 'n/a'");

        static BROKEN: &[MigrationDescriptor] = &[migration("x", "latest")];
        assert!(matches!(
            select_range(BROKEN, "1.0.0", "2.0.0"),
            Err(CatalogError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn unknown_migration_lists_keys() {
        let err = find_migration(CATALOG, "z").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown migration: z\n\nAvailable migrations: a, c, b, b2"
        );
        assert_eq!(find_migration(CATALOG, "c").unwrap().version, "2.0.0");
    }
}
