use sqlx::{postgres::PgRow, PgPool, Row};
use std::str::FromStr;

use crate::models::{
    applicant::Applicant,
    criterion::{Criterion, NewCriterion},
    job_offer::{JobOffer, JobOfferStatus},
    score::ApplicantScore,
};

pub fn job_offer_from_row(row: &PgRow) -> Result<JobOffer, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(JobOffer {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        status: JobOfferStatus::from_str(&status).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        created_at: row.try_get("created_at")?,
    })
}

pub fn criterion_from_row(row: &PgRow) -> Result<Criterion, sqlx::Error> {
    Ok(Criterion {
        id: row.try_get("id")?,
        offer_id: row.try_get("offer_id")?,
        description: row.try_get("description")?,
        importance: row.try_get("importance")?,
        created_at: row.try_get("created_at")?,
    })
}

fn applicant_from_row(row: &PgRow) -> Result<Applicant, sqlx::Error> {
    Ok(Applicant {
        id: row.try_get("id")?,
        offer_id: row.try_get("offer_id")?,
        cv: row.try_get("cv")?,
        created_at: row.try_get("created_at")?,
    })
}

fn score_from_row(row: &PgRow) -> Result<ApplicantScore, sqlx::Error> {
    Ok(ApplicantScore {
        criteria_id: row.try_get("criteria_id")?,
        applicant_id: row.try_get("applicant_id")?,
        score: row.try_get("score")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new job offer; it starts out pending extraction
pub async fn create_job_offer(pool: &PgPool, text: &str) -> Result<JobOffer, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO job_offers (text, status)
        VALUES ($1, $2)
        RETURNING id, text, status, created_at
        "#,
    )
    .bind(text)
    .bind(JobOfferStatus::Pending.to_string())
    .fetch_one(pool)
    .await?;

    job_offer_from_row(&row)
}

/// List job offers by id, optionally filtered by a text substring and status
pub async fn list_job_offers(
    pool: &PgPool,
    text: Option<&str>,
    status: Option<JobOfferStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobOffer>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, text, status, created_at
        FROM job_offers
        WHERE ($1::TEXT IS NULL OR strpos(text, $1) > 0)
          AND ($2::TEXT IS NULL OR status = $2)
        ORDER BY id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(text)
    .bind(status.map(|s| s.to_string()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(job_offer_from_row).collect()
}

/// Get a job offer by ID
pub async fn get_job_offer(pool: &PgPool, offer_id: i32) -> Result<Option<JobOffer>, sqlx::Error> {
    let row = sqlx::query("SELECT id, text, status, created_at FROM job_offers WHERE id = $1")
        .bind(offer_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(job_offer_from_row).transpose()
}

/// Insert several applicants to one offer atomically
pub async fn create_applicants(
    pool: &PgPool,
    offer_id: i32,
    cvs: &[&str],
) -> Result<Vec<Applicant>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut applicants = Vec::with_capacity(cvs.len());

    for cv in cvs {
        let row = sqlx::query(
            r#"
            INSERT INTO applicants (offer_id, cv)
            VALUES ($1, $2)
            RETURNING id, offer_id, cv, created_at
            "#,
        )
        .bind(offer_id)
        .bind(*cv)
        .fetch_one(&mut *tx)
        .await?;
        applicants.push(applicant_from_row(&row)?);
    }

    tx.commit().await?;
    Ok(applicants)
}

pub async fn list_applicants(
    pool: &PgPool,
    offer_id: i32,
    cv: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Applicant>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, offer_id, cv, created_at
        FROM applicants
        WHERE offer_id = $1
          AND ($2::TEXT IS NULL OR strpos(cv, $2) > 0)
        ORDER BY id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(offer_id)
    .bind(cv)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(applicant_from_row).collect()
}

pub async fn get_applicant(
    pool: &PgPool,
    offer_id: i32,
    applicant_id: i32,
) -> Result<Option<Applicant>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, offer_id, cv, created_at FROM applicants WHERE id = $1 AND offer_id = $2",
    )
    .bind(applicant_id)
    .bind(offer_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(applicant_from_row).transpose()
}

pub async fn list_criteria(pool: &PgPool, offer_id: i32) -> Result<Vec<Criterion>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, offer_id, description, importance, created_at
        FROM criteria
        WHERE offer_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(offer_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(criterion_from_row).collect()
}

pub async fn get_criterion(
    pool: &PgPool,
    offer_id: i32,
    criterion_id: i32,
) -> Result<Option<Criterion>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, offer_id, description, importance, created_at
        FROM criteria
        WHERE id = $1 AND offer_id = $2
        "#,
    )
    .bind(criterion_id)
    .bind(offer_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(criterion_from_row).transpose()
}

/// Insert criteria for an offer atomically
pub async fn add_criteria(
    pool: &PgPool,
    offer_id: i32,
    criteria: &[NewCriterion],
) -> Result<Vec<Criterion>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(criteria.len());

    for criterion in criteria {
        let row = sqlx::query(
            r#"
            INSERT INTO criteria (offer_id, description, importance)
            VALUES ($1, $2, $3)
            RETURNING id, offer_id, description, importance, created_at
            "#,
        )
        .bind(offer_id)
        .bind(&criterion.description)
        .bind(criterion.importance)
        .fetch_one(&mut *tx)
        .await?;
        created.push(criterion_from_row(&row)?);
    }

    tx.commit().await?;
    Ok(created)
}

/// Apply a partial update to a criterion.
///
/// A new description deletes every score computed against the old one in the same
/// transaction, which puts those pairs back in front of the evaluator.
pub async fn update_criterion(
    pool: &PgPool,
    offer_id: i32,
    criterion_id: i32,
    description: Option<&str>,
    importance: Option<f64>,
) -> Result<Option<Criterion>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"
        UPDATE criteria
        SET description = COALESCE($3, description),
            importance = COALESCE($4, importance)
        WHERE id = $1 AND offer_id = $2
        RETURNING id, offer_id, description, importance, created_at
        "#,
    )
    .bind(criterion_id)
    .bind(offer_id)
    .bind(description)
    .bind(importance)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if description.is_some() {
        let deleted = sqlx::query("DELETE FROM applicant_scores WHERE criteria_id = $1")
            .bind(criterion_id)
            .execute(&mut *tx)
            .await?;
        tracing::info!(
            criterion_id,
            scores_deleted = deleted.rows_affected(),
            "Criterion description changed, scores invalidated"
        );
    }

    let criterion = criterion_from_row(&row)?;
    tx.commit().await?;
    Ok(Some(criterion))
}

pub async fn list_scores(
    pool: &PgPool,
    applicant_id: i32,
) -> Result<Vec<ApplicantScore>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT criteria_id, applicant_id, score, created_at
        FROM applicant_scores
        WHERE applicant_id = $1
        ORDER BY criteria_id ASC
        "#,
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(score_from_row).collect()
}

pub async fn get_score(
    pool: &PgPool,
    applicant_id: i32,
    criterion_id: i32,
) -> Result<Option<ApplicantScore>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT criteria_id, applicant_id, score, created_at
        FROM applicant_scores
        WHERE applicant_id = $1 AND criteria_id = $2
        "#,
    )
    .bind(applicant_id)
    .bind(criterion_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(score_from_row).transpose()
}

/// Overwrite an existing score; `None` if it has not been computed yet
pub async fn update_score(
    pool: &PgPool,
    applicant_id: i32,
    criterion_id: i32,
    score: f64,
) -> Result<Option<ApplicantScore>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE applicant_scores
        SET score = $3
        WHERE applicant_id = $1 AND criteria_id = $2
        RETURNING criteria_id, applicant_id, score, created_at
        "#,
    )
    .bind(applicant_id)
    .bind(criterion_id)
    .bind(score)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(score_from_row).transpose()
}
