//! Project business logic.
//!
//! Projects are independent of students. Who worked on a project, and which
//! materials went into it, is derived from the purchases that reference it and
//! recomputed on every read.

use crate::{
    core::validation::{optional_text, require_text},
    entities::{Project, Purchase, Student, material, project, purchase, student},
    errors::{Error, Result},
};
use sea_orm::{
    FromQueryResult, JoinType, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::{info, instrument};

/// A student who bought material for a project.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ProjectParticipant {
    /// Student id
    pub id: i64,
    /// Student name
    pub name: String,
}

/// Quantity and cost of one material across a project's purchases.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ProjectMaterialUsage {
    /// Material id
    pub material_id: i64,
    /// Material name
    pub material_name: String,
    /// Unit the quantity is counted in
    pub unit_type: String,
    /// Sum of purchased quantities
    pub total_quantity: f64,
    /// Sum of purchase costs
    pub total_cost: f64,
}

/// A project with its derived participants and material usage.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    /// The project row
    pub project: project::Model,
    /// Distinct students with purchases on the project, by name
    pub students: Vec<ProjectParticipant>,
    /// Per-material totals, by material name
    pub materials: Vec<ProjectMaterialUsage>,
}

impl ProjectSummary {
    /// Cost of everything bought for the project.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.materials.iter().map(|m| m.total_cost).sum()
    }
}

async fn project_students(db: &DatabaseConnection, project_id: i64) -> Result<Vec<ProjectParticipant>> {
    Student::find()
        .select_only()
        .column(student::Column::Id)
        .column(student::Column::Name)
        .distinct()
        .join(JoinType::InnerJoin, student::Relation::Purchases.def())
        .filter(purchase::Column::ProjectId.eq(project_id))
        .order_by_asc(student::Column::Name)
        .into_model::<ProjectParticipant>()
        .all(db)
        .await
        .map_err(Into::into)
}

async fn project_materials(
    db: &DatabaseConnection,
    project_id: i64,
) -> Result<Vec<ProjectMaterialUsage>> {
    Purchase::find()
        .select_only()
        .column_as(material::Column::Id, "material_id")
        .column_as(material::Column::Name, "material_name")
        .column_as(material::Column::UnitType, "unit_type")
        .column_as(
            Expr::col((Purchase, purchase::Column::Quantity)).sum(),
            "total_quantity",
        )
        .column_as(
            Expr::col((Purchase, purchase::Column::TotalCost)).sum(),
            "total_cost",
        )
        .join(JoinType::InnerJoin, purchase::Relation::Material.def())
        .filter(purchase::Column::ProjectId.eq(project_id))
        .group_by(material::Column::Id)
        .group_by(material::Column::Name)
        .group_by(material::Column::UnitType)
        .order_by_asc(material::Column::Name)
        .into_model::<ProjectMaterialUsage>()
        .all(db)
        .await
        .map_err(Into::into)
}

async fn summarize(db: &DatabaseConnection, project: project::Model) -> Result<ProjectSummary> {
    let students = project_students(db, project.id).await?;
    let materials = project_materials(db, project.id).await?;
    Ok(ProjectSummary {
        project,
        students,
        materials,
    })
}

/// Retrieves all projects, newest first, each with participants and material usage.
pub async fn get_all_projects(db: &DatabaseConnection) -> Result<Vec<ProjectSummary>> {
    let projects = Project::find()
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(db)
        .await?;

    let mut summaries = Vec::with_capacity(projects.len());
    for project in projects {
        summaries.push(summarize(db, project).await?);
    }
    Ok(summaries)
}

/// Retrieves one project with participants and material usage.
pub async fn get_project(db: &DatabaseConnection, project_id: i64) -> Result<Option<ProjectSummary>> {
    match get_project_by_id(db, project_id).await? {
        Some(project) => Ok(Some(summarize(db, project).await?)),
        None => Ok(None),
    }
}

/// Retrieves the bare project row by ID.
pub async fn get_project_by_id<C>(db: &C, project_id: i64) -> Result<Option<project::Model>>
where
    C: ConnectionTrait,
{
    Project::find_by_id(project_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_project_by_id`] but a missing project is an error.
pub(crate) async fn require_project<C>(db: &C, project_id: i64) -> Result<project::Model>
where
    C: ConnectionTrait,
{
    get_project_by_id(db, project_id)
        .await?
        .ok_or(Error::ProjectNotFound { id: project_id })
}

/// Projects a student has bought material for, newest first.
pub async fn get_student_projects(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<project::Model>> {
    Project::find()
        .distinct()
        .join(JoinType::InnerJoin, project::Relation::Purchases.def())
        .filter(purchase::Column::StudentId.eq(student_id))
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new project.
#[instrument(skip(db, description))]
pub async fn add_project(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
) -> Result<project::Model> {
    let name = require_text("Project name", name)?;

    let project = project::ActiveModel {
        name: Set(name),
        description: Set(optional_text(description)),
        created_at: Set(chrono::Local::now().naive_local()),
        ..Default::default()
    };
    let project = project.insert(db).await?;
    info!(project_id = project.id, "Added project");
    Ok(project)
}

/// Renames a project and replaces its description.
#[instrument(skip(db, description))]
pub async fn update_project(
    db: &DatabaseConnection,
    project_id: i64,
    name: &str,
    description: Option<String>,
) -> Result<project::Model> {
    let name = require_text("Project name", name)?;

    let mut project: project::ActiveModel = require_project(db, project_id).await?.into();
    project.name = Set(name);
    project.description = Set(optional_text(description));
    project.update(db).await.map_err(Into::into)
}

/// Deletes a project. Its purchases stay on the students' accounts, detached from any project.
#[instrument(skip(db))]
pub async fn delete_project(db: &DatabaseConnection, project_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    require_project(&txn, project_id).await?;

    let detached = Purchase::update_many()
        .col_expr(purchase::Column::ProjectId, Expr::value(Option::<i64>::None))
        .filter(purchase::Column::ProjectId.eq(project_id))
        .exec(&txn)
        .await?;
    Project::delete_by_id(project_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        project_id,
        detached = detached.rows_affected,
        "Deleted project"
    );
    Ok(())
}
