//! The server's migration catalog.
//!
//! Versions are append-only: never edit or renumber a shipped step, add a
//! new one instead.

use keystone_migration::{
    ColumnDef, ColumnType, MigrationError, MigrationRegistry, MigrationStep, SchemaChange,
};

pub const GROUPS_TABLE: &str = "groups";
pub const GROUP_ROLES_TABLE: &str = "group_roles";
pub const CE_QUEUE_TABLE: &str = "ce_queue";

/// Build the registry of every schema migration, ordered by version.
pub fn server_migrations() -> Result<MigrationRegistry, MigrationError> {
    MigrationRegistry::new()
        .with(create_groups())?
        .with(create_group_roles())?
        .with(drop_index_component_uuid_in_group_roles())?
        .with(rename_component_uuid_in_group_roles())?
        .with(create_ce_queue())
}

fn create_groups() -> MigrationStep {
    MigrationStep::new(1, "Create table groups")
        .change(SchemaChange::create_table(
            GROUPS_TABLE,
            vec![
                ColumnDef::new("uuid", ColumnType::Varchar(40)).primary_key(),
                ColumnDef::new("name", ColumnType::Varchar(500)).not_null(),
                ColumnDef::new("description", ColumnType::Varchar(200)),
                ColumnDef::timestamp_now("created_at"),
                ColumnDef::timestamp_now("updated_at"),
            ],
        ))
        .change(SchemaChange::create_unique_index(
            GROUPS_TABLE,
            "uq_groups_name",
            &["name"],
        ))
}

fn create_group_roles() -> MigrationStep {
    MigrationStep::new(2, "Create table group_roles")
        .change(SchemaChange::create_table(
            GROUP_ROLES_TABLE,
            vec![
                ColumnDef::new("uuid", ColumnType::Varchar(40)).primary_key(),
                ColumnDef::new("group_uuid", ColumnType::Varchar(40)),
                ColumnDef::new("role", ColumnType::Varchar(64)).not_null(),
                ColumnDef::new("component_uuid", ColumnType::Varchar(40)),
                ColumnDef::timestamp_now("created_at"),
                ColumnDef::timestamp_now("updated_at"),
            ],
        ))
        .change(SchemaChange::create_index(
            GROUP_ROLES_TABLE,
            "group_roles_group_uuid",
            &["group_uuid"],
        ))
        .change(SchemaChange::create_index(
            GROUP_ROLES_TABLE,
            "group_roles_component_uuid",
            &["component_uuid"],
        ))
}

fn drop_index_component_uuid_in_group_roles() -> MigrationStep {
    MigrationStep::new(3, "Drop index group_roles_component_uuid on group_roles").change(
        SchemaChange::drop_index(GROUP_ROLES_TABLE, "group_roles_component_uuid"),
    )
}

fn rename_component_uuid_in_group_roles() -> MigrationStep {
    MigrationStep::new(4, "Rename component_uuid to entity_uuid in group_roles")
        .change(SchemaChange::rename_column(
            GROUP_ROLES_TABLE,
            "component_uuid",
            "entity_uuid",
        ))
        .change(SchemaChange::create_index(
            GROUP_ROLES_TABLE,
            "group_roles_entity_uuid",
            &["entity_uuid"],
        ))
}

fn create_ce_queue() -> MigrationStep {
    MigrationStep::new(5, "Create table ce_queue")
        .change(SchemaChange::create_table(
            CE_QUEUE_TABLE,
            vec![
                ColumnDef::new("uuid", ColumnType::Uuid).primary_key(),
                ColumnDef::new("task_type", ColumnType::Varchar(40)).not_null(),
                ColumnDef::new("payload", ColumnType::Json)
                    .not_null()
                    .default_expr("'{}'::jsonb"),
                ColumnDef::new("status", ColumnType::Varchar(15)).not_null(),
                ColumnDef::new("error_message", ColumnType::Text),
                ColumnDef::new("result", ColumnType::Json),
                ColumnDef::timestamp_now("submitted_at"),
                ColumnDef::new("started_at", ColumnType::Timestamp),
                ColumnDef::new("completed_at", ColumnType::Timestamp),
                ColumnDef::timestamp_now("created_at"),
                ColumnDef::timestamp_now("updated_at"),
            ],
        ))
        .change(SchemaChange::create_index(
            CE_QUEUE_TABLE,
            "ce_queue_status_submitted_at",
            &["status", "submitted_at"],
        ))
}

#[cfg(test)]
mod tests {
    use keystone_migration::{MemoryDatabase, MigrationRunner};

    use super::*;

    #[test]
    fn catalog_versions_are_unique_and_contiguous() {
        let registry = server_migrations().unwrap();
        let versions: Vec<i64> = registry.steps().map(|s| s.version()).collect();
        let expected: Vec<i64> = (1..=registry.len() as i64).collect();
        assert_eq!(versions, expected);
    }

    #[tokio::test]
    async fn catalog_applies_cleanly_and_is_idempotent() {
        let db = MemoryDatabase::new();
        let runner = MigrationRunner::new(server_migrations().unwrap());

        let first = runner.run(&db).await.unwrap();
        assert_eq!(first.applied, vec![1, 2, 3, 4, 5]);
        let schema = db.snapshot().await;

        let second = runner.run(&db).await.unwrap();
        assert_eq!(second.recorded(), 0);
        assert_eq!(second.skipped, vec![1, 2, 3, 4, 5]);
        assert_eq!(db.snapshot().await, schema);

        assert!(db.has_column(GROUP_ROLES_TABLE, "entity_uuid").await);
        assert!(!db.has_column(GROUP_ROLES_TABLE, "component_uuid").await);
        assert!(db.has_index(GROUP_ROLES_TABLE, "group_roles_entity_uuid").await);
        assert!(db.has_index(GROUPS_TABLE, "uq_groups_name").await);
        assert!(db.has_table(CE_QUEUE_TABLE).await);
    }

    #[tokio::test]
    async fn component_uuid_index_is_dropped_once() {
        let db = MemoryDatabase::new();
        let through_v2 = MigrationRunner::new(
            MigrationRegistry::new()
                .with(create_groups())
                .unwrap()
                .with(create_group_roles())
                .unwrap(),
        );
        through_v2.run(&db).await.unwrap();
        assert!(db.has_index(GROUP_ROLES_TABLE, "group_roles_component_uuid").await);

        let drop_only = MigrationRunner::new(
            MigrationRegistry::new()
                .with(drop_index_component_uuid_in_group_roles())
                .unwrap(),
        );

        let report = drop_only.run(&db).await.unwrap();
        assert_eq!(report.applied, vec![3]);
        assert!(!db.has_index(GROUP_ROLES_TABLE, "group_roles_component_uuid").await);
        assert_eq!(db.applied_versions().await, vec![1, 2, 3]);
        let ledger = db.ledger().await;

        let report = drop_only.run(&db).await.unwrap();
        assert_eq!(report.skipped, vec![3]);
        assert_eq!(db.ledger().await, ledger);
    }

    #[tokio::test]
    async fn manually_dropped_index_is_recorded_as_satisfied() {
        let db = MemoryDatabase::new();
        MigrationRunner::new(
            MigrationRegistry::new()
                .with(create_groups())
                .unwrap()
                .with(create_group_roles())
                .unwrap(),
        )
        .run(&db)
        .await
        .unwrap();

        db.apply_out_of_band(&SchemaChange::drop_index(
            GROUP_ROLES_TABLE,
            "group_roles_component_uuid",
        ))
        .await
        .unwrap();

        let report = MigrationRunner::new(server_migrations().unwrap())
            .run(&db)
            .await
            .unwrap();

        assert_eq!(report.satisfied, vec![3]);
        assert_eq!(report.applied, vec![4, 5]);
        assert_eq!(db.applied_versions().await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn already_renamed_column_only_gets_its_index() {
        let db = MemoryDatabase::new();
        MigrationRunner::new(
            MigrationRegistry::new()
                .with(create_groups())
                .unwrap()
                .with(create_group_roles())
                .unwrap()
                .with(drop_index_component_uuid_in_group_roles())
                .unwrap(),
        )
        .run(&db)
        .await
        .unwrap();

        db.apply_out_of_band(&SchemaChange::rename_column(
            GROUP_ROLES_TABLE,
            "component_uuid",
            "entity_uuid",
        ))
        .await
        .unwrap();

        let report = MigrationRunner::new(server_migrations().unwrap())
            .run(&db)
            .await
            .unwrap();

        // The rename is skipped but the index creation still runs.
        assert_eq!(report.applied, vec![4, 5]);
        assert!(db.has_index(GROUP_ROLES_TABLE, "group_roles_entity_uuid").await);
    }
}
