use biometrics::{Collector, Counter, Moments};

pub(crate) static TRANSPORT_SENDS: Counter = Counter::new("ragline.transport.sends");
pub(crate) static TRANSPORT_SEND_ERRORS: Counter = Counter::new("ragline.transport.send_errors");
pub(crate) static TRANSPORT_PROBES: Counter = Counter::new("ragline.transport.probes");
pub(crate) static TRANSPORT_PROBE_ERRORS: Counter = Counter::new("ragline.transport.probe_errors");

pub(crate) static SESSION_TRANSITIONS: Counter = Counter::new("ragline.session.transitions");

pub(crate) static PIPELINE_SUBMISSIONS: Counter = Counter::new("ragline.pipeline.submissions");
pub(crate) static PIPELINE_REJECTED: Counter = Counter::new("ragline.pipeline.rejected");
pub(crate) static PIPELINE_ERROR_MESSAGES: Counter =
    Counter::new("ragline.pipeline.error_messages");
pub(crate) static PIPELINE_TIMEOUTS: Counter = Counter::new("ragline.pipeline.timeouts");
pub(crate) static PIPELINE_REQUEST_TIME: Moments =
    Moments::new("ragline.pipeline.request_time_seconds");

pub(crate) static PARSE_CODE_BLOCKS: Counter = Counter::new("ragline.parse.code_blocks");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&TRANSPORT_SENDS);
    collector.register_counter(&TRANSPORT_SEND_ERRORS);
    collector.register_counter(&TRANSPORT_PROBES);
    collector.register_counter(&TRANSPORT_PROBE_ERRORS);

    collector.register_counter(&SESSION_TRANSITIONS);

    collector.register_counter(&PIPELINE_SUBMISSIONS);
    collector.register_counter(&PIPELINE_REJECTED);
    collector.register_counter(&PIPELINE_ERROR_MESSAGES);
    collector.register_counter(&PIPELINE_TIMEOUTS);
    collector.register_moments(&PIPELINE_REQUEST_TIME);

    collector.register_counter(&PARSE_CODE_BLOCKS);
}
