use std::collections::HashMap;

/// Pricing templates addressable by a short alias on the command line.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("stash-50", "1EXMmcztXGb-EOrebHCrPrhFwQuRB0RpTl0UVeMtcMNk"),
    ("stash-100", "1Y2z7UZIIuvF3Twka6tXoovkbxyxXXz4qLnr9W43BIFs"),
    ("kubedb-30", "1n8zRoI5qjBaqa5hrogAey8OFd8-q7nCE9ysxwullb0g"),
    ("kubedb-40", "1s5751cd1SWZAy824njvTz2-iSC4V7NXRoFoCmZfoIcQ"),
    ("kubedb-45", "1VN3C_fDdUG_-zgFwvPkASVYzVmVr9E2Scv1Z2uqBRrY"),
    ("kubedb-cluster-edu", "18niPAUxB0OzsWTSln2OYuMqlXvHidozquqVwhtaFKYg"),
];

#[derive(Debug, Clone)]
pub struct TemplateAliases {
    aliases: HashMap<String, String>,
}

impl Default for TemplateAliases {
    fn default() -> Self {
        Self {
            aliases: BUILTIN_TEMPLATES
                .iter()
                .map(|(alias, id)| (alias.to_string(), id.to_string()))
                .collect(),
        }
    }
}

impl TemplateAliases {
    /// Built-in aliases overlaid with `extra`; `extra` wins on conflicts.
    pub fn with_overrides(extra: &HashMap<String, String>) -> Self {
        let mut aliases = Self::default();
        for (alias, id) in extra {
            aliases.aliases.insert(alias.clone(), id.clone());
        }
        aliases
    }

    /// Document id for an alias; anything else is taken as an id already.
    pub fn resolve(&self, template: &str) -> String {
        self.aliases
            .get(template)
            .cloned()
            .unwrap_or_else(|| template.to_string())
    }
}
