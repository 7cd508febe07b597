use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub created: String,
    pub updated: String,
    pub deleted: String,
    pub delete_prompt: String,
    pub create_failed: String,
    pub update_failed: String,
    pub delete_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            created: "Book \"{title}\" created".into(),
            updated: "Book \"{title}\" updated".into(),
            deleted: "Book \"{title}\" deleted".into(),
            delete_prompt: "Do you really want to delete \"{title}\"?".into(),
            create_failed: "Could not create book: {error}".into(),
            update_failed: "Could not update book: {error}".into(),
            delete_failed: "Could not delete \"{title}\": {error}".into(),
        }
    }
}

impl Messages {
    pub fn created(&self, title: &str) -> String {
        render(&self.created, title, "")
    }

    pub fn updated(&self, title: &str) -> String {
        render(&self.updated, title, "")
    }

    pub fn deleted(&self, title: &str) -> String {
        render(&self.deleted, title, "")
    }

    pub fn delete_prompt(&self, title: &str) -> String {
        render(&self.delete_prompt, title, "")
    }

    pub fn create_failed(&self, error: &str) -> String {
        render(&self.create_failed, "", error)
    }

    pub fn update_failed(&self, error: &str) -> String {
        render(&self.update_failed, "", error)
    }

    pub fn delete_failed(&self, title: &str, error: &str) -> String {
        render(&self.delete_failed, title, error)
    }
}

fn render(template: &str, title: &str, error: &str) -> String {
    template.replace("{title}", title).replace("{error}", error)
}
