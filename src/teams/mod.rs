pub mod tables;

/// Prefix of labels that name a team explicitly.
const TEAM_PREFIX: &str = "team/";

/// Maps labels or components of one issue source to team names.
#[derive(Debug, Clone, Copy)]
pub struct TeamClassifier {
    areas: &'static [(&'static str, &'static str)],
    aliases: &'static [(&'static str, &'static str)],
}

impl TeamClassifier {
    pub const fn new(
        areas: &'static [(&'static str, &'static str)],
        aliases: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { areas, aliases }
    }

    pub const fn che() -> Self {
        Self::new(tables::CHE_AREAS, tables::TEAM_ALIASES)
    }

    pub const fn theia() -> Self {
        Self::new(tables::THEIA_LABELS, tables::TEAM_ALIASES)
    }

    pub const fn jira() -> Self {
        Self::new(tables::JIRA_COMPONENTS, tables::TEAM_ALIASES)
    }

    /// Team of an issue, or `None` when nothing matches.
    ///
    /// Explicit `team/*` labels win and keep the order they were found in,
    /// each team listed once after aliasing.
    /// Otherwise area labels are looked up in the table; unknown ones are
    /// dropped and the resulting teams are de-duplicated and sorted.
    pub fn classify<S: AsRef<str>>(&self, team_labels: &[S], area_labels: &[S]) -> Option<String> {
        let mut explicit: Vec<&str> = Vec::new();
        for label in team_labels {
            if let Some(team) = label.as_ref().strip_prefix(TEAM_PREFIX) {
                let team = self.alias(team);
                if !explicit.contains(&team) {
                    explicit.push(team);
                }
            }
        }
        if !explicit.is_empty() {
            return Some(explicit.join(","));
        }

        let mut teams: Vec<&str> = Vec::new();
        for label in area_labels {
            if let Some(team) = self.lookup(label.as_ref()) {
                if !teams.contains(&team) {
                    teams.push(team);
                }
            }
        }
        teams.sort_unstable();

        if teams.is_empty() {
            None
        } else {
            Some(teams.join(","))
        }
    }

    fn alias<'a>(&self, team: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(from, _)| *from == team)
            .map(|(_, to)| *to)
            .unwrap_or(team)
    }

    fn lookup(&self, label: &str) -> Option<&'static str> {
        self.areas
            .iter()
            .find(|(area, _)| *area == label)
            .map(|(_, team)| *team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn single_team_label() {
        assert_eq!(
            TeamClassifier::che().classify(&["team/plugins"], NONE),
            Some("plugins".into())
        );
    }

    #[test]
    fn team_alias_is_applied() {
        assert_eq!(
            TeamClassifier::che().classify(&["team/languages"], NONE),
            Some("plugins".into())
        );
    }

    #[test]
    fn multiple_team_labels_keep_discovery_order() {
        assert_eq!(
            TeamClassifier::che().classify(&["team/plugins", "team/editors"], NONE),
            Some("plugins,editors".into())
        );
    }

    #[test]
    fn aliased_team_labels_are_not_repeated() {
        assert_eq!(
            TeamClassifier::che().classify(&["team/plugins", "team/languages"], NONE),
            Some("plugins".into())
        );
        assert_eq!(
            TeamClassifier::che().classify(&["team/editors", "team/plugins", "team/editors"], NONE),
            Some("editors,plugins".into())
        );
    }

    #[test]
    fn team_labels_win_over_areas() {
        assert_eq!(
            TeamClassifier::che().classify(&["team/deploy"], &["area/che-theia"]),
            Some("deploy".into())
        );
    }

    #[test]
    fn area_label_maps_to_team() {
        assert_eq!(
            TeamClassifier::che().classify(NONE, &["area/che-theia"]),
            Some("editors".into())
        );
    }

    #[test]
    fn area_teams_are_unique_and_sorted() {
        assert_eq!(
            TeamClassifier::che().classify(NONE, &["area/hosted-che", "area/doc", "area/telemetry"]),
            Some("documentation,hosted-che".into())
        );
    }

    #[test]
    fn unknown_areas_are_dropped() {
        let classifier = TeamClassifier::che();
        assert_eq!(classifier.classify(NONE, &["area/unknown"]), None);
        assert_eq!(
            classifier.classify(NONE, &["area/unknown", "area/git"]),
            Some("plugins".into())
        );
        assert_eq!(classifier.classify(NONE, NONE), None);
    }

    #[test]
    fn jira_components_use_prose_names() {
        let classifier = TeamClassifier::jira();
        assert_eq!(
            classifier.classify(NONE, &["editors: theia", "area/hosted-che"]),
            Some("editors,hosted-che".into())
        );
        assert_eq!(
            classifier.classify(NONE, &["languages: debugger, devfiles, lsp, samples, stacks"]),
            Some("plugins".into())
        );
    }

    #[test]
    fn theia_labels_are_unprefixed() {
        assert_eq!(
            TeamClassifier::theia().classify(NONE, &["vscode", "monaco", "bug"]),
            Some("editors,plugins".into())
        );
    }
}
