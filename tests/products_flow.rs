use storefront_api::{
    db::create_pool,
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::product_service,
    state::AppState,
};
use uuid::Uuid;

// Runs against a real Postgres and skips when none is configured, seeding
// its own users so it can run alongside the other integration tests.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(Some(AppState { pool }))
}

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let email = format!("{role}-{id}@example.com");

    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, 'dummy')")
        .bind(id)
        .bind(&email)
        .execute(&state.pool)
        .await?;
    sqlx::query("INSERT INTO profiles (id, email, role) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(&email)
        .bind(role)
        .execute(&state.pool)
        .await?;

    Ok(AuthUser {
        user_id: id,
        email,
        role: role.to_string(),
    })
}

#[tokio::test]
async fn update_keeps_clears_and_replaces_url() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = create_user(&state, "admin").await?;

    let created = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Poster".into(),
            price: 1500,
            url: Some("https://example.com/poster.png".into()),
        },
    )
    .await?
    .data
    .unwrap();

    // Field absent from the payload keeps the stored URL.
    let updated = product_service::update_product(
        &state,
        &admin,
        created.id,
        UpdateProductRequest {
            name: Some("Framed Poster".into()),
            price: None,
            url: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.name, "Framed Poster");
    assert_eq!(updated.price, 1500);
    assert_eq!(updated.url.as_deref(), Some("https://example.com/poster.png"));

    // Explicit null clears it.
    let cleared = product_service::update_product(
        &state,
        &admin,
        created.id,
        UpdateProductRequest {
            name: None,
            price: None,
            url: Some(None),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cleared.url, None);

    // A new value replaces it.
    let replaced = product_service::update_product(
        &state,
        &admin,
        created.id,
        UpdateProductRequest {
            name: None,
            price: Some(1800),
            url: Some(Some("https://example.com/framed.png".into())),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(replaced.price, 1800);
    assert_eq!(replaced.url.as_deref(), Some("https://example.com/framed.png"));

    Ok(())
}

#[tokio::test]
async fn product_writes_require_admin() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user = create_user(&state, "user").await?;

    let err = product_service::create_product(
        &state,
        &user,
        CreateProductRequest {
            name: "Sticker".into(),
            price: 100,
            url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = product_service::update_product(
        &state,
        &user,
        Uuid::new_v4(),
        UpdateProductRequest {
            name: None,
            price: None,
            url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}
