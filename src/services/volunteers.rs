//! Volunteers service

use crate::{
    error::AppResult,
    models::{
        volunteer::{CreateVolunteer, UpdateVolunteer, Volunteer, VolunteerQuery},
        Page,
    },
    repository::Repository,
};

/// Trim skills and drop empty or repeated entries, keeping the first spelling
fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|known| known.eq_ignore_ascii_case(skill)) {
            out.push(skill.to_string());
        }
    }
    out
}

#[derive(Clone)]
pub struct VolunteersService {
    repository: Repository,
}

impl VolunteersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &VolunteerQuery) -> AppResult<Page<Volunteer>> {
        let (items, total) = self.repository.volunteers.list(query).await?;
        Ok(Page::new(items, total, &query.pagination()))
    }

    pub async fn get(&self, id: i32) -> AppResult<Volunteer> {
        self.repository.volunteers.get_by_id(id).await
    }

    pub async fn create(&self, mut data: CreateVolunteer) -> AppResult<Volunteer> {
        data.skills = normalize_skills(&data.skills);
        self.repository.volunteers.create(&data).await
    }

    pub async fn update(&self, id: i32, mut data: UpdateVolunteer) -> AppResult<Volunteer> {
        data.skills = data.skills.as_deref().map(normalize_skills);
        self.repository.volunteers.update(id, &data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.volunteers.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skills() {
        let skills = vec![
            " driving ".to_string(),
            "".to_string(),
            "Driving".to_string(),
            "first aid".to_string(),
        ];
        assert_eq!(normalize_skills(&skills), vec!["driving", "first aid"]);
    }
}
