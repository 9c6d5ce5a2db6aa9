use std::fmt;

use super::record::Record;

/// The four listable resources of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Province,
    City,
    Village,
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().singular)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Text,
    /// ISO timestamp shown as a date
    Date,
    /// `role_id`: 1 is an administrator
    Role,
    /// `disabled` flag shown as active/inactive
    Status,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    /// Tried in order, first non-empty wins
    pub fields: &'static [&'static str],
    pub width: u16,
    pub format: ColumnFormat,
}

/// Everything that differs between resources lives here, so list, count,
/// create and delete paths stay generic over `ResourceKind`.
#[derive(Debug)]
pub struct ResourceSpec {
    pub endpoint: &'static str,
    /// Fields whose first non-empty value identifies a record for deletion
    pub id_fields: &'static [&'static str],
    pub name_fields: &'static [&'static str],
    /// Value submitted when this resource is picked as a parent filter
    pub option_value_fields: &'static [&'static str],
    pub parent: Option<ResourceKind>,
    /// Query key used to filter this list by its parent
    pub parent_param: Option<&'static str>,
    pub singular: &'static str,
    pub plural: &'static str,
    pub columns: &'static [Column],
}

const CREATED: Column = Column {
    title: "Created",
    fields: &["created_at"],
    width: 14,
    format: ColumnFormat::Date,
};

static PROVINCE: ResourceSpec = ResourceSpec {
    endpoint: "/province/",
    id_fields: &["province", "name"],
    name_fields: &["province", "name"],
    option_value_fields: &["id", "province", "name"],
    parent: None,
    parent_param: None,
    singular: "province",
    plural: "provinces",
    columns: &[
        Column {
            title: "Province",
            fields: &["province", "name"],
            width: 30,
            format: ColumnFormat::Text,
        },
        CREATED,
    ],
};

static CITY: ResourceSpec = ResourceSpec {
    endpoint: "/city/",
    id_fields: &["city", "name"],
    name_fields: &["city", "name"],
    option_value_fields: &["id", "city", "name"],
    parent: Some(ResourceKind::Province),
    parent_param: Some("province_id"),
    singular: "city",
    plural: "cities",
    columns: &[
        Column {
            title: "City",
            fields: &["city", "name"],
            width: 26,
            format: ColumnFormat::Text,
        },
        Column {
            title: "Province",
            fields: &["province_name", "province"],
            width: 24,
            format: ColumnFormat::Text,
        },
        CREATED,
    ],
};

static VILLAGE: ResourceSpec = ResourceSpec {
    endpoint: "/village/",
    id_fields: &["village", "name"],
    name_fields: &["village", "name"],
    option_value_fields: &["id", "village", "name"],
    parent: Some(ResourceKind::City),
    parent_param: Some("city_id"),
    singular: "village",
    plural: "villages",
    columns: &[
        Column {
            title: "Village",
            fields: &["village", "name"],
            width: 24,
            format: ColumnFormat::Text,
        },
        Column {
            title: "City",
            fields: &["city_name", "city"],
            width: 20,
            format: ColumnFormat::Text,
        },
        Column {
            title: "Province",
            fields: &["province_name", "province"],
            width: 20,
            format: ColumnFormat::Text,
        },
        CREATED,
    ],
};

static USER: ResourceSpec = ResourceSpec {
    endpoint: "/users/",
    id_fields: &["id"],
    name_fields: &["username"],
    option_value_fields: &["id"],
    parent: None,
    parent_param: None,
    singular: "user",
    plural: "users",
    columns: &[
        Column {
            title: "Username",
            fields: &["username"],
            width: 16,
            format: ColumnFormat::Text,
        },
        Column {
            title: "Full name",
            fields: &["fullname"],
            width: 22,
            format: ColumnFormat::Text,
        },
        Column {
            title: "Email",
            fields: &["email"],
            width: 26,
            format: ColumnFormat::Text,
        },
        Column {
            title: "Phone",
            fields: &["phone_number"],
            width: 14,
            format: ColumnFormat::Text,
        },
        Column {
            title: "Role",
            fields: &["role_id"],
            width: 8,
            format: ColumnFormat::Role,
        },
        Column {
            title: "Status",
            fields: &["disabled"],
            width: 9,
            format: ColumnFormat::Status,
        },
    ],
};

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Province,
        ResourceKind::City,
        ResourceKind::Village,
        ResourceKind::User,
    ];

    pub fn spec(&self) -> &'static ResourceSpec {
        match self {
            ResourceKind::Province => &PROVINCE,
            ResourceKind::City => &CITY,
            ResourceKind::Village => &VILLAGE,
            ResourceKind::User => &USER,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ResourceKind::Province => 0,
            ResourceKind::City => 1,
            ResourceKind::Village => 2,
            ResourceKind::User => 3,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        self.spec().endpoint
    }

    pub fn parent(&self) -> Option<ResourceKind> {
        self.spec().parent
    }

    pub fn parent_param(&self) -> Option<&'static str> {
        self.spec().parent_param
    }

    /// Identifier used in `DELETE <endpoint><id>`.
    pub fn record_id(&self, record: &Record) -> Option<String> {
        record.first_text(self.spec().id_fields)
    }

    pub fn display_name(&self, record: &Record) -> String {
        record
            .first_text(self.spec().name_fields)
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn option_value(&self, record: &Record) -> Option<String> {
        record.first_text(self.spec().option_value_fields)
    }

    /// Title-cased plural, e.g. "Provinces".
    pub fn title(&self) -> String {
        let plural = self.spec().plural;
        let mut chars = plural.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
