//! Template storage for one expansion run.
//!
//! The registry is append-only: a name can be defined once and is never
//! removed. Templates are held behind `Rc` so a caller can keep one alive
//! while expansion continues to mutate the expander.

use std::collections::HashMap;
use std::rc::Rc;

use crate::macros::error::ExpandError;
use crate::macros::types::Template;

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Rc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `template`, failing if its name is already taken.
    pub fn define(&mut self, template: Template) -> Result<Rc<Template>, ExpandError> {
        if let Some(previous) = self.templates.get(&template.name) {
            return Err(ExpandError::Redefined {
                name: template.name,
                previous: format!("{}:{}", previous.file(), previous.line()),
            });
        }
        let template = Rc::new(template);
        self.templates
            .insert(template.name.clone(), Rc::clone(&template));
        Ok(template)
    }

    pub fn get(&self, name: &str) -> Option<Rc<Template>> {
        self.templates.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values().map(|t| t.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::types::Expanded;
    use crate::syntax::parse_str;

    fn template(text: &str, file: &str) -> Template {
        let expr = parse_str(text).unwrap().remove(0);
        Template::parse(&Expanded::new(expr, file)).unwrap()
    }

    #[test]
    fn define_then_get() {
        let mut reg = TemplateRegistry::new();
        reg.define(template("define greet name\n\techo $name\n", "a.lb"))
            .unwrap();
        assert!(reg.contains("greet"));
        assert_eq!(reg.get("greet").unwrap().params, vec!["name"]);
        assert!(reg.get("other").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn redefinition_reports_previous_site() {
        let mut reg = TemplateRegistry::new();
        reg.define(template("define t\n\techo 1\n", "first.lb"))
            .unwrap();
        let err = reg
            .define(template("define t\n\techo 2\n", "second.lb"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "template \"t\" redefined; previous define: first.lb:1"
        );
        assert_eq!(reg.get("t").unwrap().file(), "first.lb");
    }

    #[test]
    fn names_are_sorted() {
        let mut reg = TemplateRegistry::new();
        for name in ["b", "c", "a"] {
            reg.define(template(&format!("define {name}\n"), "x.lb"))
                .unwrap();
        }
        assert_eq!(reg.names(), vec!["a", "b", "c"]);
    }
}
