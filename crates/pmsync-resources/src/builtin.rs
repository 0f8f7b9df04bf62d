use pmsync_core::{FieldKind as K, ResourceKind as R, ResourceTypeConfig};

pub(crate) fn builtin_configs() -> Vec<ResourceTypeConfig> {
    vec![
        // Organization structure.
        ResourceTypeConfig::new(R::Subsidiaries)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("invoice_number_format", K::String)
            .col("invoice_number_scope", K::String)
            .col("show_delivery_date", K::Boolean)
            .col("archived_at", K::Timestamp)
            .belongs_to("bill_from", "bill_from_id", R::ContactEntries)
            .belongs_to("default_tax_rate", "default_tax_rate_id", R::TaxRates),
        ResourceTypeConfig::new(R::TaxRates)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("primary_component_name", K::String)
            .col("primary_component_value", K::Numeric)
            .col("secondary_component_name", K::String)
            .col("secondary_component_value", K::Numeric)
            .col("archived_at", K::Timestamp)
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries),
        ResourceTypeConfig::new(R::DocumentTypes)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("tax1_name", K::String)
            .col("tax1_value", K::Numeric)
            .col("tax2_name", K::String)
            .col("tax2_value", K::Numeric)
            .col("locale", K::String)
            .col("document_template_id", K::Integer)
            .col("exportable_type_id", K::Integer)
            .col("note", K::String)
            .col("footer", K::String)
            .col("archived_at", K::Timestamp)
            .json("template_options")
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries),
        ResourceTypeConfig::new(R::Companies)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("billing_name", K::String)
            .col("vat", K::String)
            .col("default_currency", K::String)
            .col("company_code", K::String)
            .col("domain", K::String)
            .col("due_days", K::Integer)
            .col("external_id", K::String)
            .col("created_at", K::Timestamp)
            .col("archived_at", K::Timestamp)
            .json("tag_list")
            .json("contact")
            .json("custom_fields")
            .belongs_to("default_subsidiary", "default_subsidiary_id", R::Subsidiaries)
            .belongs_to("default_tax_rate", "default_tax_rate_id", R::TaxRates)
            .belongs_to("default_document_type", "default_document_type_id", R::DocumentTypes),
        ResourceTypeConfig::new(R::ContactEntries)
            .col("contactable_type", K::String)
            .col("name", K::String)
            .col("email", K::String)
            .col("phone", K::String)
            .col("website", K::String)
            .col("address", K::String)
            .col("city", K::String)
            .col("state", K::String)
            .col("zipcode", K::String)
            .col("country", K::String)
            .col("vat", K::String)
            .col("billing_address", K::Boolean)
            .belongs_to("company", "company_id", R::Companies)
            .belongs_to("person", "person_id", R::People)
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries),
        ResourceTypeConfig::new(R::People)
            .required(&["first_name", "last_name"])
            .col_not_null("first_name", K::String)
            .col_not_null("last_name", K::String)
            .col("email", K::String)
            .col("title", K::String)
            .col("role_id", K::Integer)
            .col("is_user", K::Boolean)
            .col("joined_at", K::Timestamp)
            .col("last_seen_at", K::Timestamp)
            .col("archived_at", K::Timestamp)
            .col("avatar_url", K::String)
            .json("tag_list")
            .json("contact")
            .json("custom_fields")
            .belongs_to("manager", "manager_id", R::People)
            .belongs_to("company", "company_id", R::Companies)
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries),
        // Workflow and board structure.
        ResourceTypeConfig::new(R::Workflows)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("archived_at", K::Timestamp),
        ResourceTypeConfig::new(R::WorkflowStatuses)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("color_id", K::Integer)
            .col("position", K::Integer)
            .col("category_id", K::Integer)
            .belongs_to_not_null("workflow", "workflow_id", R::Workflows),
        ResourceTypeConfig::new(R::Projects)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("number", K::String)
            .col("project_number", K::String)
            .col("project_type_id", K::Integer)
            .col("project_color_id", K::Integer)
            .col("last_activity_at", K::Timestamp)
            .col("public_access", K::Boolean)
            .col("time_on_tasks", K::Boolean)
            .col("template", K::Boolean)
            .col("budget_closing_date", K::Date)
            .col("needs_invoicing", K::Boolean)
            .col("created_at", K::Timestamp)
            .col("archived_at", K::Timestamp)
            .json("tag_colors")
            .json("tag_list")
            .json("custom_fields")
            .belongs_to("company", "company_id", R::Companies)
            .belongs_to("project_manager", "project_manager_id", R::People)
            .belongs_to("last_actor", "last_actor_id", R::People)
            .belongs_to("workflow", "workflow_id", R::Workflows),
        ResourceTypeConfig::new(R::Boards)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("position", K::Integer)
            .col("placement", K::Integer)
            .col("archived_at", K::Timestamp)
            .belongs_to("project", "project_id", R::Projects),
        ResourceTypeConfig::new(R::TaskLists)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("position", K::Integer)
            .col("placement", K::Integer)
            .col("email_key", K::String)
            .col("archived_at", K::Timestamp)
            .belongs_to("project", "project_id", R::Projects)
            .belongs_to("board", "board_id", R::Boards),
        ResourceTypeConfig::new(R::Tasks)
            .required(&["title"])
            .col_not_null("title", K::String)
            .col("description", K::String)
            .col("number", K::Integer)
            .col("task_number", K::String)
            .col("private", K::Boolean)
            .col("due_date", K::Date)
            .col("start_date", K::Date)
            .col("closed", K::Boolean)
            .col("closed_at", K::Timestamp)
            .col("created_at", K::Timestamp)
            .col("updated_at", K::Timestamp)
            .col("initial_estimate", K::Integer)
            .col("worked_time", K::Integer)
            .col("remaining_time", K::Integer)
            .col("billable_time", K::Integer)
            .col("placement", K::Integer)
            .json("tag_list")
            .json("custom_fields")
            .belongs_to("project", "project_id", R::Projects)
            .belongs_to("task_list", "task_list_id", R::TaskLists)
            .belongs_to("assignee", "assignee_id", R::People)
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("last_actor", "last_actor_id", R::People)
            .belongs_to("parent_task", "parent_task_id", R::Tasks)
            .belongs_to("workflow_status", "workflow_status_id", R::WorkflowStatuses),
        // Sales.
        ResourceTypeConfig::new(R::Pipelines)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("pipeline_type_id", K::Integer)
            .col("created_at", K::Timestamp)
            .col("updated_at", K::Timestamp)
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("updater", "updater_id", R::People),
        ResourceTypeConfig::new(R::DealStatuses)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("position", K::Integer)
            .col("color_id", K::Integer)
            .col("status_id", K::Integer)
            .col("probability", K::Integer)
            .col("time_tracking_enabled", K::Boolean)
            .col("archived_at", K::Timestamp)
            .belongs_to("pipeline", "pipeline_id", R::Pipelines),
        ResourceTypeConfig::new(R::LostReasons)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("archived_at", K::Timestamp),
        ResourceTypeConfig::new(R::Deals)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("date", K::Date)
            .col("end_date", K::Date)
            .col("number", K::String)
            .col("deal_number", K::String)
            .col("suffix", K::String)
            .col("time_approval", K::Boolean)
            .col("deal_type_id", K::Integer)
            .col("budget", K::Boolean)
            .col("probability", K::Integer)
            .col("currency", K::String)
            .col("revenue", K::Numeric)
            .col("created_at", K::Timestamp)
            .col("closed_at", K::Timestamp)
            .col("sales_status_updated_at", K::Timestamp)
            .json("tag_list")
            .json("custom_fields")
            .belongs_to("company", "company_id", R::Companies)
            .belongs_to("responsible", "responsible_id", R::People)
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("contact", "contact_id", R::People)
            .belongs_to("deal_status", "deal_status_id", R::DealStatuses)
            .belongs_to("project", "project_id", R::Projects)
            .belongs_to("lost_reason", "lost_reason_id", R::LostReasons)
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries)
            .belongs_to("pipeline", "pipeline_id", R::Pipelines)
            .belongs_to("document_type", "document_type_id", R::DocumentTypes)
            .belongs_to("tax_rate", "tax_rate_id", R::TaxRates),
        ResourceTypeConfig::new(R::Sections)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("position", K::Integer)
            .belongs_to("deal", "deal_id", R::Deals),
        // Services and pricing. Service types are keyed by their remote id column.
        ResourceTypeConfig::new(R::ServiceTypes)
            .keyed_by("service_type_id")
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("description", K::String)
            .col("archived_at", K::Timestamp)
            .belongs_to("assignee", "assignee_id", R::People),
        ResourceTypeConfig::new(R::Services)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("position", K::Integer)
            .col("unit_id", K::Integer)
            .col("price", K::Numeric)
            .col("quantity", K::Numeric)
            .col("billable", K::Boolean)
            .col("time_tracking_enabled", K::Boolean)
            .col("expense_tracking_enabled", K::Boolean)
            .col("booking_tracking_enabled", K::Boolean)
            .col("estimated_time", K::Integer)
            .col("budgeted_time", K::Integer)
            .col("worked_time", K::Integer)
            .col("created_at", K::Timestamp)
            .col("deleted_at", K::Timestamp)
            .json("custom_fields")
            .belongs_to("deal", "deal_id", R::Deals)
            .belongs_to("section", "section_id", R::Sections)
            .belongs_to("person", "person_id", R::People)
            .belongs_to_via(
                "service_type",
                "service_type_id",
                R::ServiceTypes,
                "service_type_id",
            ),
        ResourceTypeConfig::new(R::RateCards)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("archived_at", K::Timestamp)
            .belongs_to("company", "company_id", R::Companies)
            .belongs_to("creator", "creator_id", R::People),
        ResourceTypeConfig::new(R::Prices)
            .col("name", K::String)
            .col("rate", K::Numeric)
            .col("unit_id", K::Integer)
            .col("currency", K::String)
            .col("billing_type_id", K::Integer)
            .belongs_to("rate_card", "rate_card_id", R::RateCards)
            .belongs_to_via(
                "service_type",
                "service_type_id",
                R::ServiceTypes,
                "service_type_id",
            ),
        // Time tracking and resourcing. Events are keyed by their remote id column.
        ResourceTypeConfig::new(R::TimeEntries)
            .required(&["date", "time"])
            .col_not_null("date", K::Date)
            .col_not_null("time", K::Integer)
            .col("billable_time", K::Integer)
            .col("note", K::String)
            .col("approved", K::Boolean)
            .col("approved_at", K::Timestamp)
            .col("started_at", K::Timestamp)
            .col("timer_started_at", K::Timestamp)
            .col("track_method_id", K::Integer)
            .col("overhead", K::Boolean)
            .col("created_at", K::Timestamp)
            .col("updated_at", K::Timestamp)
            .belongs_to("person", "person_id", R::People)
            .belongs_to("service", "service_id", R::Services)
            .belongs_to("task", "task_id", R::Tasks)
            .belongs_to("approver", "approver_id", R::People)
            .belongs_to("creator", "creator_id", R::People),
        ResourceTypeConfig::new(R::Timers)
            .col("started_at", K::Timestamp)
            .col("stopped_at", K::Timestamp)
            .col("total_time", K::Integer)
            .belongs_to("time_entry", "time_entry_id", R::TimeEntries)
            .belongs_to("person", "person_id", R::People),
        ResourceTypeConfig::new(R::Events)
            .keyed_by("event_id")
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("event_type_id", K::Integer)
            .col("icon_id", K::String)
            .col("color_id", K::Integer)
            .col("limitation_type_id", K::Integer)
            .col("sort_order", K::Integer)
            .col("archived_at", K::Timestamp),
        ResourceTypeConfig::new(R::Bookings)
            .required(&["started_on", "ended_on"])
            .col_not_null("started_on", K::Date)
            .col_not_null("ended_on", K::Date)
            .col("hours", K::Integer)
            .col("time", K::Integer)
            .col("total_time", K::Integer)
            .col("total_working_days", K::Integer)
            .col("percentage", K::Integer)
            .col("booking_method_id", K::Integer)
            .col("note", K::String)
            .col("draft", K::Boolean)
            .col("approved", K::Boolean)
            .col("approved_at", K::Timestamp)
            .col("rejected", K::Boolean)
            .col("rejected_reason", K::String)
            .col("created_at", K::Timestamp)
            .col("updated_at", K::Timestamp)
            .json("custom_fields")
            .belongs_to("person", "person_id", R::People)
            .belongs_to("service", "service_id", R::Services)
            .belongs_to_via("event", "event_id", R::Events, "event_id")
            .belongs_to("approver", "approver_id", R::People)
            .belongs_to("creator", "creator_id", R::People),
        ResourceTypeConfig::new(R::Entitlements)
            .col("start_date", K::Date)
            .col("end_date", K::Date)
            .col("allocated", K::Numeric)
            .col("used", K::Numeric)
            .col("pending", K::Numeric)
            .col("note", K::String)
            .belongs_to("person", "person_id", R::People)
            .belongs_to_via("event", "event_id", R::Events, "event_id"),
        ResourceTypeConfig::new(R::HolidayCalendars)
            .required(&["name"])
            .col_not_null("name", K::String),
        ResourceTypeConfig::new(R::Holidays)
            .required(&["name", "date"])
            .col_not_null("name", K::String)
            .col_not_null("date", K::Date)
            .col("half_day", K::Boolean)
            .belongs_to("holiday_calendar", "holiday_calendar_id", R::HolidayCalendars),
        ResourceTypeConfig::new(R::Expenses)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("date", K::Date)
            .col("pay_on", K::Date)
            .col("paid_on", K::Date)
            .col("currency", K::String)
            .col("amount", K::Numeric)
            .col("quantity", K::Numeric)
            .col("billable_amount", K::Numeric)
            .col("approved", K::Boolean)
            .col("approved_at", K::Timestamp)
            .col("reimbursable", K::Boolean)
            .col("created_at", K::Timestamp)
            .json("custom_fields")
            .belongs_to("deal", "deal_id", R::Deals)
            .belongs_to("service", "service_id", R::Services)
            .belongs_to("person", "person_id", R::People)
            .belongs_to("vendor", "vendor_id", R::Companies)
            .belongs_to("tax_rate", "tax_rate_id", R::TaxRates)
            .belongs_to("approver", "approver_id", R::People),
        ResourceTypeConfig::new(R::PurchaseOrders)
            .col("subject", K::String)
            .col("number", K::String)
            .col("status_id", K::Integer)
            .col("issued_on", K::Date)
            .col("delivery_on", K::Date)
            .col("total_cost", K::Numeric)
            .col("total_received", K::Numeric)
            .col("currency", K::String)
            .col("created_at", K::Timestamp)
            .belongs_to("vendor", "vendor_id", R::Companies)
            .belongs_to("deal", "deal_id", R::Deals)
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("document_type", "document_type_id", R::DocumentTypes)
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries),
        // Invoicing.
        ResourceTypeConfig::new(R::Invoices)
            .col("number", K::String)
            .col("subject", K::String)
            .col("note", K::String)
            .col("invoiced_on", K::Date)
            .col("sent_on", K::Date)
            .col("pay_on", K::Date)
            .col("delivery_on", K::Date)
            .col("paid_on", K::Date)
            .col("finalized_on", K::Date)
            .col("currency", K::String)
            .col("amount", K::Numeric)
            .col("amount_tax", K::Numeric)
            .col("amount_with_tax", K::Numeric)
            .col("amount_paid", K::Numeric)
            .col("amount_unpaid", K::Numeric)
            .col("invoice_type_id", K::Integer)
            .col("created_at", K::Timestamp)
            .json("tag_list")
            .json("custom_fields")
            .belongs_to("company", "company_id", R::Companies)
            .belongs_to("document_type", "document_type_id", R::DocumentTypes)
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("issuer", "issuer_id", R::People)
            .belongs_to("subsidiary", "subsidiary_id", R::Subsidiaries)
            .belongs_to("parent_invoice", "parent_invoice_id", R::Invoices)
            .belongs_to("bill_to", "bill_to_id", R::ContactEntries)
            .belongs_to("bill_from", "bill_from_id", R::ContactEntries),
        ResourceTypeConfig::new(R::LineItems)
            .col("description", K::String)
            .col("quantity", K::Numeric)
            .col("unit_price", K::Numeric)
            .col("amount", K::Numeric)
            .col("discount", K::Numeric)
            .col("position", K::Integer)
            .col("unit_id", K::Integer)
            .belongs_to_not_null("invoice", "invoice_id", R::Invoices)
            .belongs_to("service", "service_id", R::Services)
            .belongs_to("tax_rate", "tax_rate_id", R::TaxRates),
        ResourceTypeConfig::new(R::Payments)
            .required(&["amount"])
            .col_not_null("amount", K::Numeric)
            .col("currency", K::String)
            .col("paid_on", K::Date)
            .col("note", K::String)
            .col("external_id", K::String)
            .col("created_at", K::Timestamp)
            .belongs_to("invoice", "invoice_id", R::Invoices),
        // Custom fields, discussion and files.
        ResourceTypeConfig::new(R::CustomFields)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("data_type_id", K::Integer)
            .col("customizable_type", K::String)
            .col("position", K::Integer)
            .col("required", K::Boolean)
            .col("archived_at", K::Timestamp)
            .belongs_to("project", "project_id", R::Projects),
        ResourceTypeConfig::new(R::CustomFieldOptions)
            .required(&["name"])
            .col_not_null("name", K::String)
            .col("position", K::Integer)
            .col("color_id", K::Integer)
            .col("archived_at", K::Timestamp)
            .belongs_to_not_null("custom_field", "custom_field_id", R::CustomFields),
        ResourceTypeConfig::new(R::Comments)
            .col("body", K::String)
            .col("commentable_type", K::String)
            .col("hidden", K::Boolean)
            .col("created_at", K::Timestamp)
            .col("edited_at", K::Timestamp)
            .col("pinned_at", K::Timestamp)
            .json("reactions")
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("task", "task_id", R::Tasks)
            .belongs_to("deal", "deal_id", R::Deals)
            .belongs_to("company", "company_id", R::Companies),
        ResourceTypeConfig::new(R::Attachments)
            .col("name", K::String)
            .col("content_type", K::String)
            .col("size", K::Integer)
            .col("url", K::String)
            .col("attachable_type", K::String)
            .col("created_at", K::Timestamp)
            .belongs_to("creator", "creator_id", R::People)
            .belongs_to("task", "task_id", R::Tasks)
            .belongs_to("comment", "comment_id", R::Comments)
            .belongs_to("deal", "deal_id", R::Deals)
            .belongs_to("invoice", "invoice_id", R::Invoices),
    ]
}
