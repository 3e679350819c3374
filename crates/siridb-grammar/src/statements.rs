//! Statement templates understood by the prompt.

use crate::element::{choice, keywords, kw, opt, punct, seq, Element};

const COLLECTIONS: &[&str] = &["series", "servers", "pools", "users", "groups", "shards"];

const ACCESS: &[&str] = &[
    "full", "modify", "write", "read", "show", "select", "insert", "list", "count", "create",
    "drop", "grant", "revoke", "alter",
];

const AGGREGATES: &[&str] = &[
    "count",
    "mean",
    "median",
    "sum",
    "min",
    "max",
    "first",
    "last",
    "difference",
    "derivative",
    "stddev",
    "variance",
    "points",
];

const SHOW_FIELDS: &[&str] = &[
    "active_handles",
    "buffer_path",
    "buffer_size",
    "dbname",
    "dbpath",
    "duration_log",
    "duration_num",
    "list_limit",
    "log_level",
    "max_open_files",
    "mem_usage",
    "open_files",
    "pool",
    "received_points",
    "reindex_progress",
    "select_points_limit",
    "selected_points",
    "server",
    "startup_time",
    "status",
    "sync_progress",
    "time_precision",
    "timezone",
    "uptime",
    "version",
    "who_am_i",
];

const LOG_LEVELS: &[&str] = &["debug", "info", "warning", "error", "critical"];

const HELP_TOPICS: &[&str] = &[
    "alter", "calc", "count", "create", "drop", "grant", "list", "revoke", "select", "show",
    "timeit",
];

fn user_password() -> Element {
    seq([kw("user"), Element::Name, kw("set"), kw("password"), Element::Name])
}

fn tail() -> Element {
    opt(Element::Rest)
}

/// Every top-level statement, in the order their first keywords are reported.
pub(crate) fn statements() -> Vec<Element> {
    vec![
        seq([
            kw("select"),
            choice([
                punct("*"),
                seq([
                    keywords(AGGREGATES),
                    punct("("),
                    opt(Element::Number),
                    punct(")"),
                ]),
            ]),
            kw("from"),
            Element::Name,
            tail(),
        ]),
        seq([kw("list"), keywords(COLLECTIONS), tail()]),
        seq([kw("count"), keywords(COLLECTIONS), tail()]),
        seq([kw("show"), opt(keywords(SHOW_FIELDS)), tail()]),
        seq([
            kw("create"),
            choice([
                user_password(),
                seq([kw("group"), Element::Name, kw("for"), Element::Name]),
            ]),
        ]),
        seq([
            kw("alter"),
            choice([
                user_password(),
                seq([
                    kw("database"),
                    kw("set"),
                    keywords(&["drop_threshold", "list_limit", "select_points_limit", "timezone"]),
                    Element::Rest,
                ]),
                seq([
                    kw("group"),
                    Element::Name,
                    kw("set"),
                    kw("expression"),
                    Element::Name,
                ]),
                seq([
                    kw("server"),
                    Element::Name,
                    kw("set"),
                    kw("log_level"),
                    keywords(LOG_LEVELS),
                ]),
            ]),
        ]),
        seq([
            kw("drop"),
            choice([
                seq([kw("series"), tail()]),
                seq([kw("shards"), tail()]),
                seq([kw("group"), Element::Name]),
                seq([kw("user"), Element::Name]),
                seq([kw("server"), Element::Name]),
            ]),
        ]),
        seq([
            kw("grant"),
            keywords(ACCESS),
            kw("to"),
            keywords(&["user", "group"]),
            Element::Name,
        ]),
        seq([
            kw("revoke"),
            keywords(ACCESS),
            kw("from"),
            keywords(&["user", "group"]),
            Element::Name,
        ]),
        seq([kw("calc"), Element::Rest]),
        seq([kw("timeit"), Element::Rest]),
        seq([kw("help"), opt(keywords(HELP_TOPICS))]),
    ]
}
