use filehub_core::service::hierarchy_service::HierarchyService;
use filehub_core::{
    Category, CategoryId, CategoryPatch, CoreContext, HierarchyError, NewCategory, NewFileEntry,
    RepoError,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use tempfile::TempDir;
use uuid::Uuid;

fn setup() -> (TempDir, CoreContext) {
    let dir = TempDir::new().unwrap();
    let context = CoreContext::open_at(dir.path()).unwrap();
    (dir, context)
}

fn create(service: &HierarchyService<'_>, name: &str, parent: Option<CategoryId>) -> Category {
    let mut new_category = NewCategory::root(name, format!("{name} downloads"), Uuid::new_v4());
    if let Some(parent_id) = parent {
        new_category = new_category.child_of(parent_id);
    }
    service.create_category(&new_category).unwrap()
}

/// Electronics -> Phones -> Smartphones.
fn electronics_chain(service: &HierarchyService<'_>) -> (Category, Category, Category) {
    let electronics = create(service, "Electronics", None);
    let phones = create(service, "Phones", Some(electronics.id));
    let smartphones = create(service, "Smartphones", Some(phones.id));
    (electronics, phones, smartphones)
}

fn attach_file(context: &CoreContext, category_id: CategoryId) {
    context
        .files()
        .create(&NewFileEntry {
            filename: "manual.pdf".to_string(),
            original_name: "Manual.pdf".to_string(),
            description: "User manual".to_string(),
            size_bytes: 2048,
            storage_path: "uploads/manual.pdf".to_string(),
            category_id,
            uploaded_by_id: Uuid::new_v4(),
            is_public: true,
        })
        .unwrap();
}

fn write_raw(dir: &TempDir, partition: &str, id: Uuid, record: &Value) {
    std::fs::write(
        dir.path().join(partition).join(format!("{id}.json")),
        serde_json::to_string_pretty(record).unwrap(),
    )
    .unwrap();
}

fn write_category(dir: &TempDir, id: Uuid, name: &str, parent: Option<Uuid>) {
    let record = json!({
        "id": id.to_string(),
        "name": name,
        "description": "hand written",
        "parentId": parent.map(|p| p.to_string()),
        "createdById": Uuid::new_v4().to_string(),
        "createdAt": 1_700_000_000_000_i64,
        "updatedAt": 1_700_000_000_000_i64,
    });
    write_raw(dir, "categories", id, &record);
}

#[test]
fn compute_path_lists_names_from_root() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, _, smartphones) = electronics_chain(&service);

    assert_eq!(
        service.compute_path(smartphones.id).unwrap(),
        vec!["Electronics", "Phones", "Smartphones"]
    );
    assert_eq!(service.compute_path(electronics.id).unwrap(), vec!["Electronics"]);
    assert_eq!(
        service.path_label(smartphones.id).unwrap(),
        "Electronics > Phones > Smartphones"
    );
    assert!(matches!(
        service.compute_path(Uuid::new_v4()).unwrap_err(),
        HierarchyError::NotFound(_)
    ));
}

#[test]
fn create_rejects_unknown_parent() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let missing = Uuid::new_v4();

    let error = service
        .create_category(&NewCategory::root("Orphan", "No parent", Uuid::new_v4()).child_of(missing))
        .unwrap_err();
    assert!(matches!(error, HierarchyError::ParentNotFound(id) if id == missing));
    assert_eq!(context.categories().count(), 0);
}

#[test]
fn create_validates_fields() {
    let (_dir, context) = setup();
    let service = context.hierarchy();

    let error = service
        .create_category(&NewCategory::root("  ", "desc", Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(error, HierarchyError::Validation(_)));

    let error = service
        .create_category(&NewCategory::root("x".repeat(51), "desc", Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(error, HierarchyError::Validation(_)));
}

#[test]
fn moving_ancestor_under_descendant_is_rejected() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, phones, smartphones) = electronics_chain(&service);

    assert!(!service
        .can_reparent(electronics.id, Some(smartphones.id))
        .unwrap());
    assert!(!service.can_reparent(phones.id, Some(phones.id)).unwrap());
    assert!(service.can_reparent(smartphones.id, None).unwrap());
    assert!(service
        .can_reparent(smartphones.id, Some(electronics.id))
        .unwrap());

    let error = service
        .reparent_category(electronics.id, Some(smartphones.id))
        .unwrap_err();
    assert!(matches!(
        error,
        HierarchyError::CycleDetected { category_id, parent_id }
            if category_id == electronics.id && parent_id == smartphones.id
    ));

    let error = service
        .reparent_category(phones.id, Some(phones.id))
        .unwrap_err();
    assert!(matches!(error, HierarchyError::SelfParent(_)));

    let stored = context.categories().find_by_pk(electronics.id).unwrap().unwrap();
    assert_eq!(stored.parent_id, None);
}

#[test]
fn reparent_checks_both_ids_exist() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, _, _) = electronics_chain(&service);

    assert!(matches!(
        service.can_reparent(electronics.id, Some(Uuid::new_v4())),
        Err(HierarchyError::ParentNotFound(_))
    ));
    assert!(matches!(
        service.can_reparent(Uuid::new_v4(), None),
        Err(HierarchyError::NotFound(_))
    ));
}

#[test]
fn valid_moves_update_paths() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, phones, smartphones) = electronics_chain(&service);

    let moved = service.reparent_category(smartphones.id, Some(electronics.id)).unwrap();
    assert_eq!(moved.parent_id, Some(electronics.id));
    assert_eq!(
        service.compute_path(smartphones.id).unwrap(),
        vec!["Electronics", "Smartphones"]
    );

    let promoted = service.reparent_category(phones.id, None).unwrap();
    assert!(promoted.is_root());
    assert_eq!(service.compute_path(phones.id).unwrap(), vec!["Phones"]);
}

#[test]
fn update_category_renames_without_touching_parent() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, phones, _) = electronics_chain(&service);

    let renamed = service
        .update_category(
            phones.id,
            &CategoryPatch {
                name: Some("Mobile".to_string()),
                ..CategoryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Mobile");
    assert_eq!(renamed.parent_id, Some(electronics.id));
    assert_eq!(renamed.created_at, phones.created_at);

    assert!(matches!(
        service
            .update_category(Uuid::new_v4(), &CategoryPatch::default())
            .unwrap_err(),
        HierarchyError::NotFound(_)
    ));
}

#[test]
fn delete_is_blocked_by_children_and_files() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, phones, smartphones) = electronics_chain(&service);
    attach_file(&context, smartphones.id);

    assert!(!service.can_delete(phones.id).unwrap());
    let error = service.delete_category(phones.id).unwrap_err();
    assert!(matches!(
        error,
        HierarchyError::HasChildren { child_count: 1, .. }
    ));

    assert!(!service.can_delete(smartphones.id).unwrap());
    let error = service.delete_category(smartphones.id).unwrap_err();
    assert!(matches!(error, HierarchyError::HasFiles { file_count: 1, .. }));

    assert_eq!(context.categories().count(), 3);
    assert_eq!(context.files().count(), 1);
    assert!(context.categories().find_by_pk(electronics.id).unwrap().is_some());
}

#[test]
fn delete_removes_empty_leaf() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (_, phones, smartphones) = electronics_chain(&service);

    assert!(service.can_delete(smartphones.id).unwrap());
    service.delete_category(smartphones.id).unwrap();
    assert!(context
        .categories()
        .find_by_pk(smartphones.id)
        .unwrap()
        .is_none());

    assert!(service.can_delete(phones.id).unwrap());
    assert!(matches!(
        service.delete_category(smartphones.id).unwrap_err(),
        HierarchyError::NotFound(_)
    ));
}

#[test]
fn find_children_sorts_by_name() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let root = create(&service, "Software", None);
    create(&service, "Utilities", Some(root.id));
    create(&service, "Games", Some(root.id));
    create(&service, "Drivers", Some(root.id));
    create(&service, "Music", None);

    let names: Vec<String> = context
        .categories()
        .find_children(Some(root.id))
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Drivers", "Games", "Utilities"]);

    let roots: Vec<String> = context
        .categories()
        .find_children(None)
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(roots, vec!["Music", "Software"]);
}

#[test]
fn descendants_cover_the_whole_subtree() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, phones, smartphones) = electronics_chain(&service);
    let laptops = create(&service, "Laptops", Some(electronics.id));
    create(&service, "Books", None);

    let descendants = service.descendants(electronics.id).unwrap();
    let expected: HashSet<CategoryId> = [phones.id, smartphones.id, laptops.id].into();
    assert_eq!(descendants, expected);
    assert!(service.descendants(smartphones.id).unwrap().is_empty());
}

#[test]
fn gated_moves_always_keep_a_forest() {
    let (_dir, context) = setup();
    let service = context.hierarchy();
    let ids: Vec<CategoryId> = (0..8)
        .map(|index| create(&service, &format!("Node {index}"), None).id)
        .collect();

    // Fixed LCG so the move sequence is reproducible.
    let mut state: u64 = 0x5eed;
    let mut next = |bound: usize| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as usize % bound
    };

    let mut accepted = 0;
    for _ in 0..60 {
        let child = ids[next(ids.len())];
        let parent = match next(ids.len() + 1) {
            pick if pick == ids.len() => None,
            pick => Some(ids[pick]),
        };
        let allowed = service.can_reparent(child, parent).unwrap();
        match service.reparent_category(child, parent) {
            Ok(_) => {
                assert!(allowed);
                accepted += 1;
            }
            Err(HierarchyError::CycleDetected { .. } | HierarchyError::SelfParent(_)) => {
                assert!(!allowed);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(accepted > 0);

    assert_eq!(service.verify_forest().unwrap(), ids.len());
    for id in &ids {
        let path = service.compute_path(*id).unwrap();
        assert!(path.len() <= ids.len());
        let unique: HashSet<&String> = path.iter().collect();
        assert_eq!(unique.len(), path.len());
    }
}

#[test]
fn stored_cycle_is_reported_instead_of_looping() {
    let (dir, context) = setup();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();
    write_category(&dir, a, "A", Some(b));
    write_category(&dir, b, "B", Some(a));
    write_category(&dir, c, "C", Some(a));

    let service = context.hierarchy();
    assert!(matches!(
        service.compute_path(a).unwrap_err(),
        HierarchyError::CorruptAncestry { category_id, .. } if category_id == a
    ));
    assert!(matches!(
        service.compute_path(c).unwrap_err(),
        HierarchyError::CorruptAncestry { .. }
    ));
    assert!(matches!(
        service.verify_forest().unwrap_err(),
        HierarchyError::CorruptAncestry { .. }
    ));
}

#[test]
fn dangling_parent_ends_the_path_early() {
    let (dir, context) = setup();
    let child = Uuid::new_v4();
    write_category(&dir, child, "Leftover", Some(Uuid::new_v4()));

    let service = context.hierarchy();
    assert_eq!(service.compute_path(child).unwrap(), vec!["Leftover"]);
    assert_eq!(service.verify_forest().unwrap(), 1);
}


#[test]
fn undecodable_attached_file_still_blocks_delete() {
    let (dir, context) = setup();
    let service = context.hierarchy();
    let docs = create(&service, "Docs", None);

    // Legacy record without `storagePath`; it cannot decode as a file entry.
    let file_id = Uuid::new_v4();
    write_raw(
        &dir,
        "files",
        file_id,
        &json!({
            "id": file_id.to_string(),
            "filename": "legacy.pdf",
            "categoryId": docs.id.to_string(),
            "createdAt": 1_700_000_000_000_i64,
            "updatedAt": 1_700_000_000_000_i64,
        }),
    );

    assert!(!service.can_delete(docs.id).unwrap());
    assert!(matches!(
        service.delete_category(docs.id).unwrap_err(),
        HierarchyError::HasFiles { file_count: 1, .. }
    ));
    assert!(context.categories().find_by_pk(docs.id).unwrap().is_some());
}

#[test]
fn undecodable_child_category_still_blocks_delete() {
    let (dir, context) = setup();
    let service = context.hierarchy();
    let parent = create(&service, "Archive", None);

    // Child without `description`.
    let child_id = Uuid::new_v4();
    write_raw(
        &dir,
        "categories",
        child_id,
        &json!({
            "id": child_id.to_string(),
            "name": "Old",
            "parentId": parent.id.to_string(),
            "createdAt": 1_700_000_000_000_i64,
            "updatedAt": 1_700_000_000_000_i64,
        }),
    );

    assert!(!service.can_delete(parent.id).unwrap());
    assert!(matches!(
        service.delete_category(parent.id).unwrap_err(),
        HierarchyError::HasChildren { child_count: 1, .. }
    ));
    assert!(context.categories().find_by_pk(parent.id).unwrap().is_some());
}

#[test]
fn undecodable_category_fails_reparent_checks_closed() {
    let (dir, context) = setup();
    let service = context.hierarchy();
    let (electronics, _, smartphones) = electronics_chain(&service);

    // Undecodable link in the middle: Electronics -> Broken -> Leaf.
    let broken = Uuid::new_v4();
    write_raw(
        &dir,
        "categories",
        broken,
        &json!({
            "id": broken.to_string(),
            "name": "Broken",
            "parentId": electronics.id.to_string(),
        }),
    );
    let leaf = Uuid::new_v4();
    write_category(&dir, leaf, "Leaf", Some(broken));

    assert!(matches!(
        service.can_reparent(electronics.id, Some(leaf)),
        Err(HierarchyError::Repo(RepoError::InvalidData(_)))
    ));
    assert!(matches!(
        service
            .reparent_category(electronics.id, Some(leaf))
            .unwrap_err(),
        HierarchyError::Repo(RepoError::InvalidData(_))
    ));
    assert!(matches!(
        service.verify_forest().unwrap_err(),
        HierarchyError::Repo(RepoError::InvalidData(_))
    ));

    let stored = context.categories().find_by_pk(electronics.id).unwrap().unwrap();
    assert_eq!(stored.parent_id, None);
    assert_eq!(
        context.categories().find_by_pk(smartphones.id).unwrap().unwrap().name,
        "Smartphones"
    );
}
