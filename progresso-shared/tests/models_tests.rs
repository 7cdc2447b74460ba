/// Integration tests for the models and the login flow against PostgreSQL
///
/// Skipped when DATABASE_URL is not set.

use progresso_shared::auth::authenticator::{authenticate, AuthnError, Credentials};
use progresso_shared::db::migrations::run_migrations;
use progresso_shared::db::pool::{create_pool, DatabaseConfig};
use progresso_shared::models::project::{CreateProject, Project, ProjectDetails};
use progresso_shared::models::project_member::ProjectMember;
use progresso_shared::models::task::{CreateTask, Task, TaskStatus};
use progresso_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = create_pool(DatabaseConfig::new(url)).await.expect("Failed to create pool");
    run_migrations(&pool).await.expect("Migrations failed");
    Some(pool)
}

fn unique_username(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

async fn create_user(pool: &PgPool, prefix: &str) -> User {
    User::create_if_absent(
        pool,
        CreateUser {
            username: unique_username(prefix),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .expect("Failed to create user")
    .expect("Username should be fresh")
}

fn new_task(project_id: Uuid, title: &str, status: TaskStatus) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: None,
        status,
        deadline: None,
        project_id,
        assignee_id: None,
    }
}

#[tokio::test]
async fn test_create_if_absent_keeps_first_row() {
    let Some(pool) = test_pool().await else { return };
    let user = create_user(&pool, "kim").await;

    let second = User::create_if_absent(
        &pool,
        CreateUser {
            username: user.username.clone(),
            password_hash: "other".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(second.is_none());

    let stored = User::find_by_username(&pool, &user.username).await.unwrap().unwrap();
    assert_eq!(stored.id, user.id);
    assert_eq!(stored.password_hash, "not-a-real-hash");
}

#[tokio::test]
async fn test_concurrent_first_logins_create_one_user() {
    let Some(pool) = test_pool().await else { return };
    let username = unique_username("leo");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            let credentials = Credentials {
                username: username.clone(),
                password: "secret1".to_string(),
            };
            tokio::spawn(async move { authenticate(&pool, &credentials).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().expect("login should succeed").id);
    }
    ids.dedup();

    assert_eq!(ids.len(), 1);
    assert_eq!(User::count_by_username(&pool, &username).await.unwrap(), 1);

    let wrong = Credentials {
        username,
        password: "not-the-password".to_string(),
    };
    assert!(matches!(
        authenticate(&pool, &wrong).await,
        Err(AuthnError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_children_require_existing_project() {
    let Some(pool) = test_pool().await else { return };
    let user = create_user(&pool, "mia").await;
    let missing = Uuid::new_v4();

    let task = Task::create(&pool, new_task(missing, "Orphan", TaskStatus::Todo)).await.unwrap();
    assert!(task.is_none());

    let member = ProjectMember::add_to_existing_project(&pool, user.id, missing).await.unwrap();
    assert!(member.is_none());
    assert_eq!(ProjectMember::count_by_project(&pool, missing).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_membership_hits_unique_constraint() {
    let Some(pool) = test_pool().await else { return };
    let user = create_user(&pool, "ned").await;
    let project = Project::create(
        &pool,
        CreateProject {
            name: "Website".to_string(),
            deadline: None,
            owner_id: user.id,
        },
    )
    .await
    .unwrap();

    ProjectMember::add_to_existing_project(&pool, user.id, project.id)
        .await
        .unwrap()
        .unwrap();

    let err = ProjectMember::add_to_existing_project(&pool, user.id, project.id)
        .await
        .unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(
                db_err.constraint(),
                Some(progresso_shared::models::project_member::UNIQUE_MEMBERSHIP_CONSTRAINT)
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(Project::delete(&pool, project.id).await.unwrap());
}

#[tokio::test]
async fn test_project_details_aggregate() {
    let Some(pool) = test_pool().await else { return };
    let owner = create_user(&pool, "olga").await;
    let member = create_user(&pool, "pete").await;
    let project = Project::create(
        &pool,
        CreateProject {
            name: "Analytics".to_string(),
            deadline: chrono::NaiveDate::from_ymd_opt(2030, 6, 1),
            owner_id: owner.id,
        },
    )
    .await
    .unwrap();

    ProjectMember::add_to_existing_project(&pool, member.id, project.id)
        .await
        .unwrap()
        .unwrap();
    for (title, status) in [
        ("a", TaskStatus::Done),
        ("b", TaskStatus::Done),
        ("c", TaskStatus::InProgress),
    ] {
        Task::create(&pool, new_task(project.id, title, status)).await.unwrap().unwrap();
    }

    let listed = ProjectDetails::list(&pool, Some(&member.username))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let details = &listed[0];
    assert_eq!(details.project.id, project.id);
    assert_eq!(details.owner.as_ref().map(|o| o.id), Some(owner.id));
    assert_eq!(details.members.len(), 1);
    assert_eq!(details.members[0].user.username, member.username);
    assert_eq!(details.tasks.len(), 3);
    assert_eq!(details.progress, 67);

    // The owner is not a member, so filtering by the owner finds nothing
    let by_owner = ProjectDetails::list(&pool, Some(&owner.username)).await.unwrap();
    assert!(by_owner.is_empty());

    let found = ProjectMember::find_member_by_username(&pool, project.id, &member.username)
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(member.id));

    assert!(Project::delete(&pool, project.id).await.unwrap());
    assert!(Project::find_by_id(&pool, project.id).await.unwrap().is_none());
    assert_eq!(ProjectMember::count_by_project(&pool, project.id).await.unwrap(), 0);
}
