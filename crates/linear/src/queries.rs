//! GraphQL documents sent to the Linear API.

pub const INITIATIVES_QUERY: &str = r#"
query GetInitiatives {
    initiatives {
        nodes {
            id
            icon
            color
            name
            description
            targetDate
            status
            owner {
                name
                avatarUrl
            }
        }
    }
}
"#;

/// Open projects plus those closed in the last two weeks, 50 per page.
pub const PROJECTS_QUERY: &str = r#"
query GetProjects($endCursor: String) {
    projects(
        filter: {
            or: [
                { status: { name: { nin: ["Canceled", "Completed", "Backlog"] } } },
                { completedAt: { gte: "-P14D" } },
                { canceledAt: { gte: "-P14D" } }
            ]
        },
        first: 50,
        after: $endCursor
    ) {
        pageInfo {
            hasNextPage
            endCursor
        }
        nodes {
            id
            name
            startDate
            targetDate
            description
            icon
            color
            url
            status {
                name
            }
            projectUpdates {
                nodes {
                    body
                    createdAt
                    user {
                        name
                    }
                }
            }
            initiatives {
                nodes {
                    id
                }
            }
            lead {
                name
                email
                avatarUrl
            }
            health
        }
    }
}
"#;
