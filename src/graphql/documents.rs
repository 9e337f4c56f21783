//! GraphQL operation documents

pub const ME: &str = r#"
query Me {
  me { id email createdAt displayName }
}
"#;

pub const REGISTER: &str = r#"
mutation Register($email: String!, $password: String!, $displayName: String!) {
  register(email: $email, password: $password, displayName: $displayName) {
    user { id }
  }
}
"#;

pub const LOGIN: &str = r#"
mutation Login($email: String!, $password: String!) {
  login(email: $email, password: $password) {
    user { id }
  }
}
"#;

pub const LOGOUT: &str = r#"
mutation Logout {
  logout
}
"#;

pub const UPDATE_DISPLAY_NAME: &str = r#"
mutation UpdateDisplayName($displayName: String!) {
  updateDisplayName(displayName: $displayName) { id email createdAt displayName }
}
"#;

pub const UPDATE_USER_SETTINGS: &str = r#"
mutation UpdateUserSettings($timezone: String!, $dayRolloverHour: Int!) {
  updateUserSettings(timezone: $timezone, dayRolloverHour: $dayRolloverHour) {
    id timezone dayRolloverHour
  }
}
"#;

pub const CREATE_DIARY_ENTRY: &str = r#"
mutation CreateDiaryEntry($text: String!) {
  createDiaryEntry(text: $text) { id createdAt }
}
"#;

pub const DIARY_ENTRY: &str = r#"
query DiaryEntry($dayKey: String!) {
  diaryEntry(dayKey: $dayKey) { id dayKey text createdAt }
}
"#;

pub const PAGINATED_DIARY_ENTRIES: &str = r#"
query PaginatedDiaryEntries($limit: Int!, $offset: Int!) {
  paginatedDiaryEntries(limit: $limit, offset: $offset) {
    id text dayKey createdAt
    garden { id status imageUrl publicId shareUrl progress periodKey updatedAt }
  }
}
"#;

pub const REQUEST_GENERATE_GARDEN: &str = r#"
mutation RequestGenerateGarden($period: GardenPeriod!, $periodKey: String) {
  requestGenerateGarden(period: $period, periodKey: $periodKey) {
    id status period periodKey imageUrl publicId shareUrl progress updatedAt
  }
}
"#;

pub const GARDEN: &str = r#"
query GetGarden($period: GardenPeriod!, $periodKey: String!) {
  garden(period: $period, periodKey: $periodKey) {
    id status imageUrl publicId shareUrl summary period periodKey progress updatedAt
  }
}
"#;

pub const GARDENS_BY_MONTH: &str = r#"
query GardensByMonth($monthKey: String!) {
  gardensByMonth(monthKey: $monthKey) {
    id period periodKey status imageUrl publicId summary progress shareUrl updatedAt
  }
}
"#;

pub const CURRENT_DIARY_DAY_KEY: &str = r#"
query TodayMeta {
  currentDiaryDayKey
}
"#;
