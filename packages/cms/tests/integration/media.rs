use cms::models::AuditKind;
use cms::{MediaService, Node, OperationStatus, ServiceError, media_service};
use common::NodeKind;
use cms::notifications::LifecycleEvent;
use common::hook::HookRegistry;
use sea_orm::ConnectionTrait;

use crate::support::{Failing, Recorder, TestApp, Veto, topics};

async fn setup() -> (TestApp, MediaService) {
    let app = TestApp::spawn().await;
    app.content_type(NodeKind::Media, "Image").await;
    app.content_type(NodeKind::Media, "Folder").await;
    let service = media_service(app.db.clone());
    (app, service)
}

async fn saved(service: &MediaService, parent_id: i32, alias: &str) -> Node {
    let node = service
        .create_and_save(parent_id, alias, None)
        .await
        .expect("Failed to create media");
    assert!(node.has_identity());
    node
}

fn ids(nodes: &[Node]) -> Vec<i32> {
    let mut ids: Vec<i32> = nodes.iter().map(|n| n.id).collect();
    ids.sort();
    ids
}

mod create {
    use super::*;

    #[tokio::test]
    async fn unknown_alias_is_not_found() {
        let (app, service) = setup().await;

        let err = service.create(-1, "Video", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(app.audit_entries().await.is_empty());
    }

    #[tokio::test]
    async fn returns_unsaved_node_with_creator() {
        let (app, service) = setup().await;

        let node = service.create(-1, "Image", Some(5)).await.unwrap();
        assert!(!node.has_identity());
        assert_eq!(node.parent_id, -1);
        assert_eq!(node.creator_id, 5);
        assert_eq!(node.kind, NodeKind::Media);

        // Create alone does not persist.
        assert!(service.get_root().await.unwrap().is_empty());

        let audit = app.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].kind, AuditKind::New);
        assert_eq!(audit[0].user_id, 5);
    }

    #[tokio::test]
    async fn publishes_creating_then_created() {
        let (_app, mut service) = setup().await;
        let recorder = Recorder::all(NodeKind::Media);
        let seen = recorder.handle();
        service.subscribe(recorder).await.unwrap();

        service.create(-1, "Image", None).await.unwrap();
        assert_eq!(topics(&seen), vec!["media.creating", "media.created"]);
    }

    #[tokio::test]
    async fn cancelled_create_skips_stamp_and_audit() {
        let (app, mut service) = setup().await;
        let recorder = Recorder::all(NodeKind::Media);
        let seen = recorder.handle();
        let mut hooks = HookRegistry::new();
        hooks
            .add_hook::<LifecycleEvent, _>(Veto::on(&["media.creating"]))
            .await
            .unwrap();
        hooks
            .add_hook::<LifecycleEvent, _>(recorder)
            .await
            .unwrap();
        service = service.with_hooks(hooks);

        let node = service.create(-1, "Image", Some(5)).await.unwrap();
        assert!(!node.has_identity());
        assert_eq!(node.creator_id, 0);
        assert!(service.get_by_id(1).await.unwrap().is_none());
        assert!(app.audit_entries().await.is_empty());
        // The veto runs first and short-circuits the recorder on "creating".
        assert!(topics(&seen).is_empty());

        let node = service.create_and_save(-1, "Image", None).await.unwrap();
        assert!(!node.has_identity());
        assert!(service.get_root().await.unwrap().is_empty());
    }
}

mod save {
    use super::*;

    #[tokio::test]
    async fn assigns_id_path_and_level() {
        let (app, service) = setup().await;

        let folder = saved(&service, -1, "Folder").await;
        assert_eq!(folder.path, format!("-1,{}", folder.id));
        assert_eq!(folder.level, 1);

        let image = saved(&service, folder.id, "Image").await;
        assert_eq!(image.path, format!("{},{}", folder.path, image.id));
        assert_eq!(image.level, 2);

        let stored = service.get_by_id(image.id).await.unwrap().unwrap();
        assert_eq!(stored.path, image.path);
        assert_eq!(stored.parent_id, folder.id);

        let saves = app
            .audit_entries()
            .await
            .into_iter()
            .filter(|e| e.kind == AuditKind::Save)
            .count();
        assert_eq!(saves, 2);
    }

    #[tokio::test]
    async fn unknown_parent_is_not_found() {
        let (_app, service) = setup().await;

        let mut node = service.create(999, "Image", None).await.unwrap();
        let err = service.save(&mut node, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(!node.has_identity());
    }

    #[tokio::test]
    async fn cancelled_save_persists_nothing() {
        let (app, mut service) = setup().await;
        service.subscribe(Veto::on(&["media.saving"])).await.unwrap();

        let mut node = service.create(-1, "Image", None).await.unwrap();
        let status = service.save(&mut node, None).await.unwrap();
        assert_eq!(status, OperationStatus::Cancelled);
        assert!(!node.has_identity());
        assert!(service.get_root().await.unwrap().is_empty());
        assert!(
            app.audit_entries()
                .await
                .iter()
                .all(|e| e.kind != AuditKind::Save)
        );
    }

    #[tokio::test]
    async fn save_many_commits_once_with_summary_audit() {
        let (app, mut service) = setup().await;
        let recorder = Recorder::all(NodeKind::Media);
        let seen = recorder.handle();
        service.subscribe(recorder).await.unwrap();

        let mut batch = vec![
            Node::new(NodeKind::Media, -1, 1),
            Node::new(NodeKind::Media, -1, 1),
            Node::new(NodeKind::Media, -1, 2),
        ];
        let status = service.save_many(&mut batch, Some(3)).await.unwrap();
        assert!(status.is_completed());
        assert!(batch.iter().all(|n| n.has_identity() && n.creator_id == 3));
        assert_eq!(service.get_root().await.unwrap().len(), 3);

        assert_eq!(topics(&seen), vec!["media.saving", "media.saved"]);
        let audit = app.audit_entries().await;
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].kind, AuditKind::Save);
        assert_eq!(audit[0].entity_id, -1);
    }

    #[tokio::test]
    async fn nodes_of_another_kind_are_rejected() {
        let (app, service) = setup().await;
        let audit_before = app.audit_entries().await.len();

        let mut stray = Node::new(NodeKind::Content, -1, 1);
        let err = service.save(&mut stray, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!stray.has_identity());

        let mut batch = vec![Node::new(NodeKind::Media, -1, 1), stray.clone()];
        let err = service.save_many(&mut batch, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = service.move_to_recycle_bin(&mut stray, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = service.move_to(&mut stray, -1, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = service.delete(&stray, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(service.get_root().await.unwrap().is_empty());
        assert_eq!(app.audit_entries().await.len(), audit_before);
    }

    #[tokio::test]
    async fn failed_batch_rolls_back_entirely() {
        let (app, service) = setup().await;

        let mut batch = vec![
            Node::new(NodeKind::Media, -1, 1),
            Node::new(NodeKind::Media, 999, 1),
        ];
        let err = service.save_many(&mut batch, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        assert!(batch.iter().all(|n| !n.has_identity()));
        assert!(service.get_root().await.unwrap().is_empty());
        assert!(app.audit_entries().await.is_empty());
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn children_are_exactly_the_direct_children() {
        let (_app, service) = setup().await;
        let folder = saved(&service, -1, "Folder").await;
        let a = saved(&service, folder.id, "Image").await;
        let b = saved(&service, folder.id, "Image").await;
        let nested = saved(&service, a.id, "Image").await;
        let root_image = saved(&service, -1, "Image").await;

        let children = service.get_children(folder.id).await.unwrap();
        assert_eq!(ids(&children), vec![a.id, b.id]);
        assert_eq!(service.count_children(folder.id).await.unwrap(), 2);
        assert!(service.has_children(a.id).await.unwrap());
        assert!(!service.has_children(nested.id).await.unwrap());

        let root = service.get_root().await.unwrap();
        assert_eq!(ids(&root), vec![folder.id, root_image.id]);
    }

    #[tokio::test]
    async fn descendants_include_self_and_respect_segments() {
        let (_app, service) = setup().await;

        let first = saved(&service, -1, "Folder").await;
        let child = saved(&service, first.id, "Image").await;
        let grandchild = saved(&service, child.id, "Image").await;
        // Push ids past 10 so "-1,1" and "-1,1x" coexist.
        let mut last = first.clone();
        while last.id < 12 {
            last = saved(&service, -1, "Folder").await;
        }
        assert!(last.path.starts_with(&first.path));

        let descendants = service.get_descendants(first.id).await.unwrap();
        assert_eq!(ids(&descendants), vec![first.id, child.id, grandchild.id]);

        let leaf = service.get_descendants(grandchild.id).await.unwrap();
        assert_eq!(ids(&leaf), vec![grandchild.id]);

        assert!(service.get_descendants(4242).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn by_content_type_and_by_ids() {
        let (_app, service) = setup().await;
        let folder = saved(&service, -1, "Folder").await;
        let image = saved(&service, folder.id, "Image").await;

        let images = service.get_by_content_type(image.content_type_id).await.unwrap();
        assert_eq!(ids(&images), vec![image.id]);

        let both = service.get_by_ids(&[image.id, folder.id, 999]).await.unwrap();
        assert_eq!(ids(&both), vec![folder.id, image.id]);
        assert!(service.get_by_ids(&[]).await.unwrap().is_empty());
    }
}

mod moving {
    use super::*;

    #[tokio::test]
    async fn move_saves_and_moves() {
        let (app, mut service) = setup().await;
        let source = saved(&service, -1, "Folder").await;
        let target = saved(&service, -1, "Folder").await;
        let mut image = saved(&service, source.id, "Image").await;
        let nested = saved(&service, image.id, "Image").await;

        let recorder = Recorder::all(NodeKind::Media);
        let seen = recorder.handle();
        service.subscribe(recorder).await.unwrap();
        let audit_before = app.audit_entries().await.len();

        let status = service.move_to(&mut image, target.id, Some(2)).await.unwrap();
        assert!(status.is_completed());
        assert_eq!(image.parent_id, target.id);
        assert_eq!(image.path, format!("{},{}", target.path, image.id));

        assert_eq!(
            topics(&seen),
            vec!["media.moving", "media.saving", "media.saved", "media.moved"]
        );

        let audit = app.audit_entries().await;
        let new_entries = &audit[audit_before..];
        assert_eq!(new_entries.len(), 2);
        assert_eq!(new_entries[0].kind, AuditKind::Save);
        assert_eq!(new_entries[1].kind, AuditKind::Move);
        assert!(new_entries.iter().all(|e| e.user_id == 2));

        let nested = service.get_by_id(nested.id).await.unwrap().unwrap();
        assert_eq!(nested.path, format!("{},{}", image.path, nested.id));
        assert_eq!(nested.level, 3);
        assert!(service.get_children(source.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_move_is_a_no_op() {
        let (_app, mut service) = setup().await;
        let source = saved(&service, -1, "Folder").await;
        let target = saved(&service, -1, "Folder").await;
        let mut image = saved(&service, source.id, "Image").await;

        service.subscribe(Veto::on(&["media.moving"])).await.unwrap();

        let status = service.move_to(&mut image, target.id, None).await.unwrap();
        assert!(status.is_cancelled());
        assert_eq!(image.parent_id, source.id);
        let stored = service.get_by_id(image.id).await.unwrap().unwrap();
        assert_eq!(stored.parent_id, source.id);
    }

    #[tokio::test]
    async fn vetoed_save_abandons_move() {
        let (app, mut service) = setup().await;
        let source = saved(&service, -1, "Folder").await;
        let target = saved(&service, -1, "Folder").await;
        let mut image = saved(&service, source.id, "Image").await;
        let audit_before = app.audit_entries().await.len();

        service.subscribe(Veto::on(&["media.saving"])).await.unwrap();

        let status = service.move_to(&mut image, target.id, None).await.unwrap();
        assert!(status.is_cancelled());
        assert_eq!(image.parent_id, source.id);
        assert_eq!(app.audit_entries().await.len(), audit_before);
    }

    #[tokio::test]
    async fn cannot_move_beneath_own_descendant() {
        let (_app, service) = setup().await;
        let mut folder = saved(&service, -1, "Folder").await;
        let child = saved(&service, folder.id, "Folder").await;

        let err = service.move_to(&mut folder, child.id, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(folder.parent_id, -1);

        let own_id = folder.id;
        let err = service.move_to(&mut folder, own_id, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn failing_observers_do_not_undo_a_committed_move() {
        let (app, mut service) = setup().await;
        let source = saved(&service, -1, "Folder").await;
        let target = saved(&service, -1, "Folder").await;
        let mut image = saved(&service, source.id, "Image").await;

        service
            .subscribe(Failing::on(&["media.saved", "media.moved"]))
            .await
            .unwrap();

        let status = service.move_to(&mut image, target.id, None).await.unwrap();
        assert!(status.is_completed());
        assert_eq!(image.parent_id, target.id);
        assert_eq!(image.path, format!("{},{}", target.path, image.id));

        let stored = service.get_by_id(image.id).await.unwrap().unwrap();
        assert_eq!(stored.parent_id, image.parent_id);
        assert_eq!(stored.path, image.path);

        let audit = app.audit_entries().await;
        let for_image: Vec<AuditKind> = audit
            .iter()
            .filter(|e| e.entity_id == image.id)
            .map(|e| e.kind)
            .collect();
        assert_eq!(for_image, vec![AuditKind::Save, AuditKind::Save, AuditKind::Move]);
    }
}

mod recycle_bin {
    use super::*;

    #[tokio::test]
    async fn trash_is_a_soft_delete() {
        let (app, mut service) = setup().await;
        let folder = saved(&service, -1, "Folder").await;
        let mut image = saved(&service, folder.id, "Image").await;
        let nested = saved(&service, image.id, "Image").await;

        let recorder = Recorder::all(NodeKind::Media);
        let seen = recorder.handle();
        service.subscribe(recorder).await.unwrap();

        let status = service.move_to_recycle_bin(&mut image, None).await.unwrap();
        assert!(status.is_completed());
        assert!(image.trashed);
        assert_eq!(image.path, format!("-1,-21,{}", image.id));

        let bin = service.get_in_recycle_bin().await.unwrap();
        assert_eq!(ids(&bin), vec![image.id]);
        let stored = service.get_by_id(image.id).await.unwrap().unwrap();
        assert!(stored.trashed);

        // Children follow along in the tree but are not flagged themselves.
        let nested = service.get_by_id(nested.id).await.unwrap().unwrap();
        assert!(!nested.trashed);
        assert_eq!(nested.path, format!("{},{}", image.path, nested.id));

        assert_eq!(topics(&seen), vec!["media.trashing", "media.trashed"]);
        let last = app.audit_entries().await.pop().unwrap();
        assert_eq!(last.kind, AuditKind::Move);
        assert_eq!(last.entity_id, image.id);
    }

    #[tokio::test]
    async fn cancelled_trash_leaves_node_in_place() {
        let (_app, mut service) = setup().await;
        let mut image = saved(&service, -1, "Image").await;
        service.subscribe(Veto::on(&["media.trashing"])).await.unwrap();

        let status = service.move_to_recycle_bin(&mut image, None).await.unwrap();
        assert!(status.is_cancelled());
        assert!(!image.trashed);
        assert!(service.get_in_recycle_bin().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn emptying_hard_deletes_bin_contents() {
        let (app, service) = setup().await;
        let mut image = saved(&service, -1, "Image").await;
        let nested = saved(&service, image.id, "Image").await;
        let keeper = saved(&service, -1, "Image").await;
        service.move_to_recycle_bin(&mut image, None).await.unwrap();

        let removed = service.empty_recycle_bin().await.unwrap();
        assert_eq!(removed, 2);

        assert!(service.get_in_recycle_bin().await.unwrap().is_empty());
        assert!(service.get_by_id(image.id).await.unwrap().is_none());
        assert!(service.get_by_id(nested.id).await.unwrap().is_none());
        assert!(service.get_by_id(keeper.id).await.unwrap().is_some());

        let last = app.audit_entries().await.pop().unwrap();
        assert_eq!(last.kind, AuditKind::Delete);
        assert_eq!(last.entity_id, -21);
    }
}

mod deleting {
    use super::*;

    #[tokio::test]
    async fn delete_removes_row_and_rejects_repeat() {
        let (app, service) = setup().await;
        let image = saved(&service, -1, "Image").await;

        let status = service.delete(&image, None).await.unwrap();
        assert!(status.is_completed());
        assert!(service.get_by_id(image.id).await.unwrap().is_none());

        let last = app.audit_entries().await.pop().unwrap();
        assert_eq!(last.kind, AuditKind::Delete);
        assert_eq!(last.entity_id, image.id);

        let err = service.delete(&image, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_takes_the_subtree() {
        let (_app, service) = setup().await;
        let folder = saved(&service, -1, "Folder").await;
        let image = saved(&service, folder.id, "Image").await;

        service.delete(&folder, None).await.unwrap();
        assert!(service.get_by_id(image.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelled_delete_keeps_row() {
        let (_app, mut service) = setup().await;
        let image = saved(&service, -1, "Image").await;
        service.subscribe(Veto::on(&["media.deleting"])).await.unwrap();

        let status = service.delete(&image, None).await.unwrap();
        assert!(status.is_cancelled());
        assert!(service.get_by_id(image.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_of_type_trashes_matching_nodes() {
        let (app, service) = setup().await;
        let folder = saved(&service, -1, "Folder").await;
        let a = saved(&service, folder.id, "Image").await;
        let b = saved(&service, -1, "Image").await;

        let status = service
            .delete_of_type(a.content_type_id, Some(4))
            .await
            .unwrap();
        assert!(status.is_completed());

        let bin = service.get_in_recycle_bin().await.unwrap();
        assert_eq!(ids(&bin), vec![a.id, b.id]);
        assert!(bin.iter().all(|n| n.trashed));
        assert!(service.get_by_id(folder.id).await.unwrap().is_some());
        assert!(service.get_children(folder.id).await.unwrap().is_empty());

        let last = app.audit_entries().await.pop().unwrap();
        assert_eq!(last.kind, AuditKind::Delete);
        assert_eq!(last.user_id, 4);
        assert_eq!(last.entity_id, -1);
    }

    #[tokio::test]
    async fn cancelled_delete_of_type_changes_nothing() {
        let (_app, mut service) = setup().await;
        let image = saved(&service, -1, "Image").await;
        service.subscribe(Veto::on(&["media.deleting"])).await.unwrap();

        let status = service
            .delete_of_type(image.content_type_id, None)
            .await
            .unwrap();
        assert!(status.is_cancelled());
        assert!(service.get_in_recycle_bin().await.unwrap().is_empty());
        assert!(!service.get_by_id(image.id).await.unwrap().unwrap().trashed);
    }
}

#[tokio::test]
async fn persistence_failures_propagate() {
    let (app, service) = setup().await;
    app.db
        .execute_unprepared("DROP TABLE node")
        .await
        .expect("Failed to drop table");

    let err = service.get_by_id(1).await.unwrap_err();
    assert!(matches!(err, ServiceError::Db(_)));

    let mut node = Node::new(NodeKind::Media, -1, 1);
    let err = service.save(&mut node, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Db(_)));
}
