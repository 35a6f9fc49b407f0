pub(super) fn init_metrics() {
    describe_toplevel();
    describe_ingest();
    describe_process();
    describe_object_storage();
}

fn describe_toplevel() {
    metrics::describe_counter!(FILES, "How many files have been uploaded to tubely");
}

pub(crate) const FILES: &str = "tubely.files";

fn describe_ingest() {
    metrics::describe_histogram!(
        INGEST_DURATION,
        "Timings for processing staged uploads, from probing to metadata update"
    );
    metrics::describe_counter!(
        INGEST_END,
        "How many staged uploads have finished processing"
    );
}

pub(crate) const INGEST_DURATION: &str = "tubely.ingest.duration";
pub(crate) const INGEST_END: &str = "tubely.ingest.end";

fn describe_process() {
    metrics::describe_counter!(
        PROCESS_START,
        "How many times tubely has spawned a background process"
    );
    metrics::describe_histogram!(
        PROCESS_DURATION,
        "Timings for how long background processes take to complete"
    );
    metrics::describe_counter!(PROCESS_END, "How many background processes have completed");
}

pub(crate) const PROCESS_START: &str = "tubely.process.start";
pub(crate) const PROCESS_DURATION: &str = "tubely.process.duration";
pub(crate) const PROCESS_END: &str = "tubely.process.end";

fn describe_object_storage() {
    metrics::describe_counter!(
        OBJECT_STORAGE_PUT_OBJECT,
        "How many times tubely has uploaded an object to object storage"
    );
    metrics::describe_histogram!(
        OBJECT_STORAGE_PUT_OBJECT_DURATION,
        "Timings for uploading objects to object storage"
    );
}

pub(crate) const OBJECT_STORAGE_PUT_OBJECT: &str = "tubely.object-storage.put-object";
pub(crate) const OBJECT_STORAGE_PUT_OBJECT_DURATION: &str =
    "tubely.object-storage.put-object.duration";
