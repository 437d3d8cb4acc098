//! Project management commands.
//!
//! - `hub project create <name> <path>` - Create a project and its folders
//! - `hub project list` - List projects
//! - `hub project show <id>` - Show project details
//! - `hub project update <id>` - Update project fields
//! - `hub project delete <id>` - Delete a project record

use super::{format_timestamp, DeletedOutput};
use crate::cli::{ProjectCommands, ProjectCreateArgs, ProjectUpdateArgs};
use crate::error::Result;
use crate::hub::Hub;
use crate::model::{Project, ProjectDraft, ProjectFilter, ProjectPatch};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ProjectOutput {
    id: i64,
    name: String,
    project_type: String,
    base_dir: String,
    subfolders: Vec<String>,
    description: Option<String>,
    tags: String,
    is_favorite: bool,
    created_at: String,
    updated_at: String,
}

impl From<Project> for ProjectOutput {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            project_type: p.project_type,
            base_dir: p.base_dir,
            subfolders: p.subfolders,
            description: p.description,
            tags: p.tags,
            is_favorite: p.is_favorite,
            created_at: format_timestamp(p.created_at),
            updated_at: format_timestamp(p.updated_at),
        }
    }
}

#[derive(Serialize)]
struct ProjectListOutput {
    projects: Vec<ProjectOutput>,
    count: usize,
}

/// Execute a project command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error, or a
/// storage error.
pub fn execute(command: &ProjectCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;

    let result = match command {
        ProjectCommands::Create(args) => execute_create(&mut hub, args, json),
        ProjectCommands::List { filter, search } => {
            execute_list(&hub, filter, search.as_deref(), json)
        }
        ProjectCommands::Show { id } => execute_show(&hub, *id, json),
        ProjectCommands::Update(args) => execute_update(&mut hub, args, json),
        ProjectCommands::Delete { id } => execute_delete(&mut hub, *id, json),
    };

    super::close(hub);
    result
}

fn execute_create(hub: &mut Hub, args: &ProjectCreateArgs, json: bool) -> Result<()> {
    let draft = ProjectDraft {
        name: args.name.clone(),
        project_type: args.project_type.clone(),
        base_dir: args.path.clone(),
        subfolders: args.folders.clone(),
        description: args.description.clone(),
        tags: args.tags.clone(),
        is_favorite: args.favorite,
    };

    let id = hub.create_project(&draft)?;
    let project = hub.require::<Project>(id)?;

    if json {
        return super::print_json(&ProjectOutput::from(project));
    }

    println!("Created project: {}", project.name);
    println!("  ID:   {}", project.id);
    println!("  Path: {}", project.base_dir);
    if !project.subfolders.is_empty() {
        println!("  Folders: {}", project.subfolders.join(", "));
    }
    Ok(())
}

fn execute_list(hub: &Hub, filter: &ProjectFilter, search: Option<&str>, json: bool) -> Result<()> {
    let projects = hub.list::<Project>(filter, search)?;

    if json {
        let output = ProjectListOutput {
            count: projects.len(),
            projects: projects.into_iter().map(ProjectOutput::from).collect(),
        };
        return super::print_json(&output);
    }

    if projects.is_empty() {
        println!("No projects found.");
        println!("\nCreate one with: hub project create <name> <path>");
        return Ok(());
    }

    println!("Projects ({}):\n", projects.len());
    for project in &projects {
        let star = if project.is_favorite { " *" } else { "" };
        println!("  {} [{}]{star}", project.name, project.project_type);
        println!("    ID:   {}", project.id);
        println!("    Path: {}", project.base_dir);
        if let Some(desc) = &project.description {
            println!("    Desc: {desc}");
        }
        println!();
    }
    Ok(())
}

fn execute_show(hub: &Hub, id: i64, json: bool) -> Result<()> {
    let project = hub.require::<Project>(id)?;

    if json {
        return super::print_json(&ProjectOutput::from(project));
    }

    println!("Project: {}", project.name);
    println!("  ID:      {}", project.id);
    println!("  Type:    {}", project.project_type);
    println!("  Path:    {}", project.base_dir);
    if !project.subfolders.is_empty() {
        println!("  Folders: {}", project.subfolders.join(", "));
    }
    if let Some(desc) = &project.description {
        println!("  Desc:    {desc}");
    }
    if !project.tags.is_empty() {
        println!("  Tags:    {}", project.tags);
    }
    println!("  Created: {}", super::format_local(project.created_at));
    println!("  Updated: {}", super::format_local(project.updated_at));
    Ok(())
}

fn execute_update(hub: &mut Hub, args: &ProjectUpdateArgs, json: bool) -> Result<()> {
    let patch = ProjectPatch {
        name: args.name.clone(),
        project_type: args.project_type.clone(),
        base_dir: args.path.clone(),
        subfolders: (!args.folders.is_empty()).then(|| args.folders.clone()),
        description: args.description.clone(),
        tags: args.tags.clone(),
        is_favorite: args.favorite,
    };

    hub.update::<Project>(args.id, &patch)?;
    let project = hub.require::<Project>(args.id)?;

    if json {
        return super::print_json(&ProjectOutput::from(project));
    }

    println!("Updated project: {}", project.name);
    println!("  ID: {}", project.id);
    Ok(())
}

fn execute_delete(hub: &mut Hub, id: i64, json: bool) -> Result<()> {
    hub.delete::<Project>(id)?;

    if json {
        return super::print_json(&DeletedOutput { id, deleted: true });
    }

    println!("Deleted project {id} (folders on disk were kept)");
    Ok(())
}
