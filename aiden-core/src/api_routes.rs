macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub const HEALTH: &str = v1_path!("/health");

    pub mod scan {
        pub const INITIATE: &str = v1_path!("/scan");
        pub const ITEM: &str = v1_path!("/scan/{id}");
        pub const EMAIL: &str = v1_path!("/email/{id}");
        pub const COLLECTOR_HEALTH: &str = v1_path!("/collector/health");
    }

    pub mod consents {
        pub const COLLECTION: &str = v1_path!("/consents");
    }

    pub mod organisations {
        pub const COLLECTION: &str = v1_path!("/organisations");
        pub const ITEM: &str = v1_path!("/organisations/{id}");
        pub const ADMIN: &str = v1_path!("/organisations/{id}/admin");
        pub const SETTINGS: &str = v1_path!("/organisations/{id}/settings");
        pub const EMPLOYEES: &str = v1_path!("/organisations/{id}/employees");
        pub const EMPLOYEES_BULK: &str =
            v1_path!("/organisations/{id}/employees/bulk");
    }

    pub mod employees {
        pub const ITEM: &str = v1_path!("/employees/{id}");
    }

    pub mod osint {
        pub const GENERATE: &str = v1_path!("/osint/generate");
        pub const GENERATE_PHISHING: &str =
            v1_path!("/osint/generate-phishing");
    }

    pub mod auth {
        pub const LOGIN: &str = v1_path!("/auth/login");
        pub const ME: &str = v1_path!("/auth/me");
        pub const LOGOUT: &str = v1_path!("/auth/logout");
    }
}

/// Substitute `{id}` in a route template.
pub fn with_id(template: &str, id: impl std::fmt::Display) -> String {
    template.replace("{id}", &id.to_string())
}
