//! Static label → team associations, one table per issue source.

/// Explicit `team/*` labels that are remapped to another team.
pub const TEAM_ALIASES: &[(&str, &str)] = &[("languages", "plugins")];

/// `area/*` labels of the eclipse/che GitHub repository.
pub const CHE_AREAS: &[(&str, &str)] = &[
    ("area/hosted-che", "hosted-che"),
    ("area/telemetry", "hosted-che"),
    ("area/image-puller", "hosted-che"),
    ("area/getting-started", "hosted-che"),
    ("area/devfile", "platform"),
    ("area/wsmaster", "platform"),
    ("area/factories", "platform"),
    ("area/security", "platform"),
    ("area/teams", "platform"),
    ("area/workspaces/sharing", "platform"),
    ("area/jwt-proxy", "platform"),
    ("area/cli", "deploy"),
    ("area/chectl", "deploy"),
    ("area/operator", "deploy"),
    ("area/install", "deploy"),
    ("area/machine-exec", "deploy"),
    ("area/productization", "productization"),
    ("area/ci", "productization"),
    ("area/whitelabel", "productization"),
    ("area/dashboard", "controller"),
    ("area/plugin-broker", "controller"),
    ("area/dev-workspace", "controller"),
    ("area/infra/kubernetes", "controller"),
    ("area/infra/openshift", "controller"),
    ("area/ts-workspace-client", "controller"),
    ("area/debugger", "languages"),
    ("area/devfile-registry", "languages"),
    ("area/languages", "languages"),
    ("area/lsp-support", "languages"),
    ("area/samples", "languages"),
    ("area/stacks", "languages"),
    ("area/plugin-registry", "plugins"),
    ("area/plugins", "plugins"),
    ("area/git", "plugins"),
    ("area/pr-panel", "plugins"),
    ("area/che-theia", "editors"),
    ("area/dev-experience", "devex"),
    ("area/doc", "documentation"),
];

/// Labels of the eclipse-theia/theia GitHub repository. Theia does not
/// namespace its labels, so the whole label is the key.
pub const THEIA_LABELS: &[(&str, &str)] = &[
    ("core", "editors"),
    ("editor", "editors"),
    ("monaco", "editors"),
    ("terminal", "editors"),
    ("file-search", "editors"),
    ("workspace", "editors"),
    ("keybindings", "editors"),
    ("preferences", "editors"),
    ("debug", "plugins"),
    ("vscode", "plugins"),
    ("plug-in system", "plugins"),
    ("plugin-ext", "plugins"),
    ("git", "plugins"),
    ("scm", "plugins"),
    ("languages", "plugins"),
    ("task", "plugins"),
    ("electron", "deploy"),
    ("dependencies", "productization"),
    ("security", "productization"),
    ("documentation", "documentation"),
];

/// Jira components. Che components use prose names; components injected by
/// the project importers reuse GitHub-style `area/*` names.
pub const JIRA_COMPONENTS: &[(&str, &str)] = &[
    ("OpenShift Command Line Terminal (cloudshell)", "controller"),
    (
        "controller: dashboard, dev-workspace, factory/dashboard, plugin broker, ts-workspace-client, workspace-loader",
        "controller",
    ),
    ("deploy: cli, install, machine-exec, operator", "deploy"),
    ("devex: workshops, RHPDS", "devex"),
    ("docs", "docs"),
    ("editors: theia", "editors"),
    ("languages: debugger, devfiles, lsp, samples, stacks", "plugins"),
    ("ocp", "qe"),
    (
        "platform: jwtproxy, wsmaster, devfile spec, teams, security, sharing, factory api, monitoring",
        "platform",
    ),
    ("plugins: registries, factories, git", "plugins"),
    ("productization: build & internals", "productization"),
    ("productization: security & legal", "productization"),
    ("testing", "qe"),
    ("hosted che: telemetry, kubernetes-image-puller", "hosted-che"),
    ("area/hosted-che", "hosted-che"),
    ("area/cloudshell", "controller"),
    ("area/doc", "doc"),
];

/// Teams with a `<team>-backlog` sheet, and that sheet's numeric id.
pub const TEAM_BACKLOG_SHEETS: &[(&str, i64)] = &[
    ("controller", 559612723),
    ("deploy", 299792844),
    ("devex", 1791827752),
    ("doc", 1387892873),
    ("editors", 147601621),
    ("hosted-che", 602575269),
    ("platform", 615179376),
    ("plugins", 620995623),
    ("pm", 500634577),
    ("qe", 287072407),
    ("productization", 52078153),
];
