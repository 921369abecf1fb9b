//! Resource catalog: one entry per department page.
//!
//! Each [`ResourceSpec`] names the endpoint, the table layout, the form
//! rules and the export columns for one collection. Pages build one
//! controller per spec they show.

#[cfg(test)]
#[path = "resources_test.rs"]
mod resources_test;

use crate::export::ExportColumns;
use crate::form::{FileRule, FormRules};
use crate::table::{ActionKind, BadgeVariant, Column, TableSpec};

#[derive(Clone, Debug)]
pub struct ResourceSpec {
    /// Short stable name, used in file names and on the command line.
    pub key: &'static str,
    pub label: &'static str,
    pub endpoint: &'static str,
    pub table: TableSpec,
    pub rules: FormRules,
    /// Fields offered by the edit form.
    pub form_fields: &'static [&'static str],
    pub export_columns: ExportColumns,
    pub confirm_delete: &'static str,
}

impl ResourceSpec {
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.rules.file.is_some()
    }
}

// =============================================================================
// BADGES
// =============================================================================

pub const VENDOR_STATUS: &[BadgeVariant] = &[
    BadgeVariant { value: "active", label: "已合作", class: "bg-success" },
    BadgeVariant { value: "pending", label: "洽谈中", class: "bg-warning text-dark" },
    BadgeVariant { value: "inactive", label: "已终止", class: "bg-secondary" },
];

pub const DESIGN_STATUS: &[BadgeVariant] = &[
    BadgeVariant { value: "draft", label: "草稿", class: "bg-secondary" },
    BadgeVariant { value: "review", label: "审核中", class: "bg-warning text-dark" },
    BadgeVariant { value: "approved", label: "已通过", class: "bg-success" },
];

pub const PLAN_STATUS: &[BadgeVariant] = &[
    BadgeVariant { value: "planned", label: "筹备中", class: "bg-info text-dark" },
    BadgeVariant { value: "ongoing", label: "进行中", class: "bg-primary" },
    BadgeVariant { value: "done", label: "已完成", class: "bg-success" },
    BadgeVariant { value: "cancelled", label: "已取消", class: "bg-secondary" },
];

pub const USER_ROLE: &[BadgeVariant] = &[
    BadgeVariant { value: "admin", label: "管理员", class: "bg-danger" },
    BadgeVariant { value: "leader", label: "部长", class: "bg-primary" },
    BadgeVariant { value: "member", label: "成员", class: "bg-secondary" },
];

// =============================================================================
// CATALOG
// =============================================================================

const EDIT_DELETE: [ActionKind; 2] = [ActionKind::Edit, ActionKind::Delete];
const WITH_FILES: [ActionKind; 4] = [ActionKind::View, ActionKind::Download, ActionKind::Edit, ActionKind::Delete];

#[must_use]
pub fn vendors() -> ResourceSpec {
    ResourceSpec {
        key: "vendors",
        label: "合作商家",
        endpoint: "/api/pr/vendors",
        table: TableSpec::new(
            vec![
                Column::Text { header: "名称", field: "name" },
                Column::Text { header: "联系人", field: "contact" },
                Column::Text { header: "电话", field: "phone" },
                Column::Badge { header: "状态", field: "status", variants: VENDOR_STATUS },
                Column::Date { header: "创建时间", field: "created_at" },
            ],
            EDIT_DELETE.to_vec(),
        ),
        rules: FormRules::default().require("name", "名称"),
        form_fields: &["name", "contact", "phone", "status", "notes"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("name", "名称"),
            ("contact", "联系人"),
            ("phone", "电话"),
            ("status", "状态"),
            ("notes", "备注"),
            ("created_at", "创建时间"),
        ]),
        confirm_delete: "确定要删除该商家吗？",
    }
}

#[must_use]
pub fn designs() -> ResourceSpec {
    ResourceSpec {
        key: "designs",
        label: "设计稿",
        endpoint: "/api/design/designs",
        table: TableSpec::new(
            vec![
                Column::Text { header: "标题", field: "title" },
                Column::Text { header: "文件", field: "file_name" },
                Column::FileSize { header: "大小", field: "file_size" },
                Column::Badge { header: "状态", field: "status", variants: DESIGN_STATUS },
                Column::Date { header: "上传时间", field: "created_at" },
            ],
            WITH_FILES.to_vec(),
        ),
        rules: FormRules::default()
            .require("title", "标题")
            .with_file(FileRule::new("file", "设计文件", true)),
        form_fields: &["title", "description", "status"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("title", "标题"),
            ("description", "描述"),
            ("file_name", "文件"),
            ("file_size", "大小"),
            ("status", "状态"),
            ("created_at", "上传时间"),
        ]),
        confirm_delete: "确定要删除该设计稿吗？文件将一并删除。",
    }
}

#[must_use]
pub fn meetings() -> ResourceSpec {
    ResourceSpec {
        key: "meetings",
        label: "会议记录",
        endpoint: "/api/secretary/meetings",
        table: TableSpec::new(
            vec![
                Column::Text { header: "主题", field: "title" },
                Column::Date { header: "会议日期", field: "meeting_date" },
                Column::Text { header: "地点", field: "location" },
                Column::Text { header: "记录人", field: "recorder" },
                Column::Text { header: "附件", field: "file_name" },
            ],
            WITH_FILES.to_vec(),
        ),
        rules: FormRules::default()
            .require("title", "主题")
            .require("meeting_date", "会议日期")
            .with_file(FileRule::new("file", "会议附件", false)),
        form_fields: &["title", "meeting_date", "location", "recorder", "content"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("title", "主题"),
            ("meeting_date", "会议日期"),
            ("location", "地点"),
            ("recorder", "记录人"),
            ("content", "内容"),
            ("created_at", "创建时间"),
        ]),
        confirm_delete: "确定要删除该会议记录吗？",
    }
}

#[must_use]
pub fn activities() -> ResourceSpec {
    ResourceSpec {
        key: "activities",
        label: "活动记录",
        endpoint: "/api/activity/records",
        table: TableSpec::new(
            vec![
                Column::Text { header: "活动名称", field: "title" },
                Column::Date { header: "活动日期", field: "activity_date" },
                Column::Text { header: "地点", field: "location" },
                Column::Text { header: "参与人数", field: "participants" },
                Column::Text { header: "附件", field: "file_name" },
            ],
            WITH_FILES.to_vec(),
        ),
        rules: FormRules::default()
            .require("title", "活动名称")
            .with_file(FileRule::new("file", "活动附件", false)),
        form_fields: &["title", "activity_date", "location", "participants", "summary"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("title", "活动名称"),
            ("activity_date", "活动日期"),
            ("location", "地点"),
            ("participants", "参与人数"),
            ("summary", "总结"),
            ("created_at", "创建时间"),
        ]),
        confirm_delete: "确定要删除该活动记录吗？",
    }
}

#[must_use]
pub fn plans() -> ResourceSpec {
    ResourceSpec {
        key: "plans",
        label: "活动策划",
        endpoint: "/api/activity/plans",
        table: TableSpec::new(
            vec![
                Column::Text { header: "策划名称", field: "title" },
                Column::Text { header: "负责人", field: "owner" },
                Column::Date { header: "计划日期", field: "planned_date" },
                Column::Text { header: "预算", field: "budget" },
                Column::Badge { header: "状态", field: "status", variants: PLAN_STATUS },
            ],
            EDIT_DELETE.to_vec(),
        ),
        rules: FormRules::default().require("title", "策划名称"),
        form_fields: &["title", "owner", "planned_date", "budget", "status", "description"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("title", "策划名称"),
            ("owner", "负责人"),
            ("planned_date", "计划日期"),
            ("budget", "预算"),
            ("status", "状态"),
            ("description", "说明"),
            ("created_at", "创建时间"),
        ]),
        confirm_delete: "确定要删除该策划吗？",
    }
}

#[must_use]
pub fn details() -> ResourceSpec {
    ResourceSpec {
        key: "details",
        label: "活动明细",
        endpoint: "/api/activity/details",
        table: TableSpec::new(
            vec![
                Column::Text { header: "项目", field: "item" },
                Column::Text { header: "所属策划", field: "plan_title" },
                Column::Text { header: "数量", field: "quantity" },
                Column::Text { header: "金额", field: "amount" },
                Column::Date { header: "创建时间", field: "created_at" },
            ],
            EDIT_DELETE.to_vec(),
        ),
        rules: FormRules::default().require("item", "项目"),
        form_fields: &["item", "plan_id", "quantity", "amount", "notes"],
        export_columns: ExportColumns::default(),
        confirm_delete: "确定要删除该明细吗？",
    }
}

#[must_use]
pub fn users() -> ResourceSpec {
    ResourceSpec {
        key: "users",
        label: "用户管理",
        endpoint: "/api/admin/users",
        table: TableSpec::new(
            vec![
                Column::Text { header: "用户名", field: "username" },
                Column::Text { header: "姓名", field: "display_name" },
                Column::Text { header: "部门", field: "department" },
                Column::Badge { header: "角色", field: "role", variants: USER_ROLE },
                Column::Date { header: "注册时间", field: "created_at" },
            ],
            EDIT_DELETE.to_vec(),
        ),
        rules: FormRules::default().require("username", "用户名").require("department", "部门"),
        form_fields: &["username", "display_name", "department", "role"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("username", "用户名"),
            ("display_name", "姓名"),
            ("department", "部门"),
            ("role", "角色"),
            ("created_at", "注册时间"),
        ]),
        confirm_delete: "确定要删除该用户吗？",
    }
}

#[must_use]
pub fn departments() -> ResourceSpec {
    ResourceSpec {
        key: "departments",
        label: "部门管理",
        endpoint: "/api/admin/departments",
        table: TableSpec::new(
            vec![
                Column::Text { header: "部门名称", field: "name" },
                Column::Text { header: "简介", field: "description" },
                Column::Text { header: "成员数", field: "member_count" },
                Column::Date { header: "创建时间", field: "created_at" },
            ],
            EDIT_DELETE.to_vec(),
        ),
        rules: FormRules::default().require("name", "部门名称"),
        form_fields: &["name", "description"],
        export_columns: ExportColumns(vec![
            ("id", "ID"),
            ("name", "部门名称"),
            ("description", "简介"),
            ("created_at", "创建时间"),
        ]),
        confirm_delete: "确定要删除该部门吗？",
    }
}

#[must_use]
pub fn catalog() -> Vec<ResourceSpec> {
    vec![vendors(), designs(), meetings(), activities(), plans(), details(), users(), departments()]
}

#[must_use]
pub fn find(key: &str) -> Option<ResourceSpec> {
    catalog().into_iter().find(|spec| spec.key == key)
}
