//! Wire topic names.

pub const GREETING: &str = "cord.workflow.ctlsvc.greeting";

// probe -> broker
pub const EVENT_EMIT: &str = "cord.workflow.ctlsvc.event.emit";

// manager -> broker -> manager
pub const WORKFLOW_REGISTER: &str = "cord.workflow.ctlsvc.workflow.register";
pub const WORKFLOW_REGISTER_ESSENCE: &str = "cord.workflow.ctlsvc.workflow.register_essence";
pub const WORKFLOW_LIST: &str = "cord.workflow.ctlsvc.workflow.list";
pub const WORKFLOW_LIST_RUN: &str = "cord.workflow.ctlsvc.workflow.run.list";
pub const WORKFLOW_CHECK: &str = "cord.workflow.ctlsvc.workflow.check";
pub const WORKFLOW_REMOVE: &str = "cord.workflow.ctlsvc.workflow.remove";
pub const WORKFLOW_REMOVE_RUN: &str = "cord.workflow.ctlsvc.workflow.run.remove";
pub const WORKFLOW_REPORT_NEW_RUN: &str = "cord.workflow.ctlsvc.workflow.report_new_run";
pub const WORKFLOW_REPORT_RUN_STATUS: &str = "cord.workflow.ctlsvc.workflow.report_run_status";
pub const WORKFLOW_REPORT_RUN_STATUS_BULK: &str =
  "cord.workflow.ctlsvc.workflow.report_run_status_bulk";

// broker -> manager
pub const WORKFLOW_KICKSTART: &str = "cord.workflow.ctlsvc.workflow.kickstart";
pub const WORKFLOW_CHECK_STATUS_BULK: &str = "cord.workflow.ctlsvc.workflow.check.status_bulk";

// run executor -> broker -> run executor
pub const WORKFLOW_RUN_COUNT_EVENTS: &str = "cord.workflow.ctlsvc.workflow.run.count";
pub const WORKFLOW_RUN_FETCH_EVENT: &str = "cord.workflow.ctlsvc.workflow.run.fetch";
pub const WORKFLOW_RUN_REPORT_TASK_STATUS: &str =
  "cord.workflow.ctlsvc.workflow.run.report_task_status";

// broker -> run executor
pub const WORKFLOW_RUN_NOTIFY_EVENT: &str = "cord.workflow.ctlsvc.workflow.run.notify";
