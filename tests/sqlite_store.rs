//! SQLite store integration tests.
//!
//! Run against an in-memory SQLite database (and one file-backed database
//! to exercise pool construction), with handcrafted embedding vectors.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

use studyhall::config::{Config, DbConfig};
use studyhall::migrate::run_migrations;
use studyhall::models::{AssignmentType, Category, DocMetadata, Document, EmbeddedChunk};
use studyhall::store::sqlite::SqliteStore;
use studyhall::{db, Store};

async fn memory_store() -> SqliteStore {
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn discussion_doc(thread_id: i64, content: &str) -> Document {
    Document::new(
        content.to_string(),
        DocMetadata::Discussion {
            thread_id,
            title: format!("Thread {}", thread_id),
            created_at: "2024-03-01".into(),
            is_answered: false,
            is_staff_answered: true,
            category: "projects".into(),
            subcategory: "project-1".into(),
            answer_count: 5,
            view_count: 250,
        },
    )
}

fn instruction_doc(content: &str) -> Document {
    Document::new(
        content.to_string(),
        DocMetadata::Instruction {
            document_id: "project1.pdf".into(),
            title: "Project 1".into(),
            created_at: "2024-02-01".into(),
            section: "tasks".into(),
            assignment_type: AssignmentType::Project,
            page_number: Some(2),
        },
    )
}

fn chunks(specs: &[(&str, [f32; 3])]) -> Vec<EmbeddedChunk> {
    specs
        .iter()
        .map(|(content, v)| EmbeddedChunk {
            content: content.to_string(),
            embedding: v.to_vec(),
        })
        .collect()
}

async fn chunk_rows(store: &SqliteStore) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_insert_and_search_with_metadata_roundtrip() {
    let store = memory_store().await;
    let doc = discussion_doc(7, "Thread body");
    store
        .insert_document(&doc, &chunks(&[("first chunk", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();

    let results = store
        .similarity_search(&[1.0, 0.0, 0.0], Category::Discussion, 0.5, 10)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "first chunk");
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    // Metadata came back through the JSON column with its shape intact.
    match &results[0].metadata {
        DocMetadata::Discussion {
            thread_id,
            is_staff_answered,
            answer_count,
            ..
        } => {
            assert_eq!(*thread_id, 7);
            assert!(is_staff_answered);
            assert_eq!(*answer_count, 5);
        }
        _ => panic!("expected discussion metadata"),
    }
}

#[tokio::test]
async fn test_search_is_category_scoped_and_ordered() {
    let store = memory_store().await;
    store
        .insert_document(
            &discussion_doc(1, "d"),
            &chunks(&[("close", [0.9, 0.436, 0.0]), ("closer", [0.99, 0.141, 0.0])]),
        )
        .await
        .unwrap();
    store
        .insert_document(
            &instruction_doc("i"),
            &chunks(&[("instruction chunk", [1.0, 0.0, 0.0])]),
        )
        .await
        .unwrap();

    let results = store
        .similarity_search(&[1.0, 0.0, 0.0], Category::Discussion, 0.5, 10)
        .await
        .unwrap();

    // Instruction chunk never appears in a discussion search.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].content, "closer");
    assert_eq!(results[1].content, "close");
    assert!(results[0].similarity > results[1].similarity);
}

#[tokio::test]
async fn test_search_limit_truncates() {
    let store = memory_store().await;
    let specs: Vec<(String, [f32; 3])> = (0..10)
        .map(|i| (format!("chunk-{}", i), [0.9 - i as f32 * 0.01, 0.3, 0.0]))
        .collect();
    let embedded: Vec<EmbeddedChunk> = specs
        .iter()
        .map(|(c, v)| EmbeddedChunk {
            content: c.clone(),
            embedding: v.to_vec(),
        })
        .collect();
    store
        .insert_document(&discussion_doc(1, "big thread"), &embedded)
        .await
        .unwrap();

    let results = store
        .similarity_search(&[1.0, 0.0, 0.0], Category::Discussion, 0.1, 4)
        .await
        .unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].content, "chunk-0");
}

#[tokio::test]
async fn test_delete_document_cascades_to_chunks() {
    let store = memory_store().await;
    let doc = discussion_doc(3, "doomed");
    store
        .insert_document(
            &doc,
            &chunks(&[("a", [1.0, 0.0, 0.0]), ("b", [0.0, 1.0, 0.0])]),
        )
        .await
        .unwrap();
    assert_eq!(chunk_rows(&store).await, 2);

    assert!(store.delete_document(&doc.id).await.unwrap());
    assert_eq!(chunk_rows(&store).await, 0);
    assert_eq!(store.count_documents(Category::Discussion).await.unwrap(), 0);

    // Deleting again reports nothing removed.
    assert!(!store.delete_document(&doc.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_by_category_leaves_other_category() {
    let store = memory_store().await;
    store
        .insert_document(&discussion_doc(1, "d1"), &chunks(&[("dc", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();
    store
        .insert_document(&discussion_doc(2, "d2"), &chunks(&[("dc2", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();
    store
        .insert_document(&instruction_doc("i1"), &chunks(&[("ic", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();

    let removed = store.delete_by_category(Category::Discussion).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.count_documents(Category::Discussion).await.unwrap(), 0);
    assert_eq!(store.count_documents(Category::Instruction).await.unwrap(), 1);
    assert_eq!(chunk_rows(&store).await, 1);
}

#[tokio::test]
async fn test_discussion_thread_ids() {
    let store = memory_store().await;
    store
        .insert_document(&discussion_doc(42, "x"), &chunks(&[("c", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();
    store
        .insert_document(&discussion_doc(7, "y"), &chunks(&[("c", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();
    store
        .insert_document(&instruction_doc("z"), &chunks(&[("c", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();

    assert_eq!(store.discussion_thread_ids().await.unwrap(), vec![7, 42]);
}

#[tokio::test]
async fn test_file_backed_pool_construction() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        db: DbConfig {
            path: tmp.path().join("data").join("studyhall.sqlite"),
        },
        embedding: Default::default(),
        retrieval: Default::default(),
    };

    let pool = db::connect(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let store = SqliteStore::new(pool);
    store
        .insert_document(&discussion_doc(1, "persisted"), &chunks(&[("c", [1.0, 0.0, 0.0])]))
        .await
        .unwrap();
    assert_eq!(store.count_documents(Category::Discussion).await.unwrap(), 1);
    store.pool().close().await;
}
