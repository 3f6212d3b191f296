//! Lab test uploads and retrieval.
//!
//! The result file is written to the [`LabResultStore`](crate::storage::LabResultStore)
//! before the row is inserted. If the insert fails the file is removed again,
//! so neither a row without a file nor a file without a row is left behind.

use tracing::{error, info};

use super::MedicalRecords;
use crate::error::{MedRecError, MedRecResult};
use crate::models::{now_rfc3339, LabResultFile, LabTest, NewLabTest, Upload, User};

impl MedicalRecords {
    /// Store an uploaded result file and record its metadata.
    pub fn create_lab_test(
        &self,
        user: &User,
        meta: NewLabTest,
        upload: Upload,
    ) -> MedRecResult<LabTest> {
        meta.validate()?;
        if upload.bytes.is_empty() {
            return Err(MedRecError::InvalidInput("Uploaded file is empty".into()));
        }

        let db = self.db()?;
        if db.get_patient(meta.patient_id)?.is_none() {
            return Err(MedRecError::NotFound(format!("patient {}", meta.patient_id)));
        }

        let blob = self.lab_results.store(&upload.filename, &upload.bytes)?;
        let now = now_rfc3339();
        let mut test = LabTest {
            id: 0,
            patient_id: meta.patient_id,
            bio_analyst_id: user.id,
            test_name: meta.test_name.trim().to_string(),
            test_date: now.clone(),
            file_ref: blob.file_ref,
            original_filename: upload.filename.clone(),
            content_type: upload.content_type_or_default(),
            size_bytes: blob.size_bytes,
            sha256: blob.sha256,
            notes: meta.notes,
            created_at: now,
        };

        match db.insert_lab_test(&test) {
            Ok(id) => test.id = id,
            Err(e) => {
                error!(file_ref = %test.file_ref, error = %e, "lab test insert failed, removing blob");
                if let Err(cleanup) = self.lab_results.remove(&test.file_ref) {
                    error!(file_ref = %test.file_ref, error = %cleanup, "could not remove orphaned blob");
                }
                return Err(e.into());
            }
        }

        info!(
            lab_test_id = test.id,
            patient_id = test.patient_id,
            bio_analyst_id = user.id,
            size_bytes = test.size_bytes,
            "recorded lab test"
        );
        Ok(test)
    }

    pub fn lab_test(&self, id: i64) -> MedRecResult<LabTest> {
        self.db()?
            .get_lab_test(id)?
            .ok_or_else(|| MedRecError::NotFound(format!("lab test {id}")))
    }

    pub fn list_lab_tests(&self) -> MedRecResult<Vec<LabTest>> {
        Ok(self.db()?.list_lab_tests()?)
    }

    pub fn lab_tests_for_patient(&self, patient_id: i64) -> MedRecResult<Vec<LabTest>> {
        let db = self.db()?;
        if db.get_patient(patient_id)?.is_none() {
            return Err(MedRecError::NotFound(format!("patient {patient_id}")));
        }
        Ok(db.list_lab_tests_for_patient(patient_id)?)
    }

    /// Load the result file of a lab test, verifying its digest.
    pub fn lab_test_file(&self, id: i64) -> MedRecResult<LabResultFile> {
        let test = self.lab_test(id)?;
        let bytes = self
            .lab_results
            .read(&test.file_ref, &test.sha256)
            .map_err(|e| {
                error!(lab_test_id = id, error = %e, "lab result file unreadable");
                MedRecError::from(e)
            })?;
        Ok(LabResultFile {
            filename: test.original_filename,
            content_type: test.content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{records, register};
    use super::*;
    use crate::models::{sample_profile, Role};

    fn upload(bytes: &[u8]) -> Upload {
        Upload {
            filename: "cbc.csv".into(),
            content_type: Some("text/csv".into()),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_upload_and_download() {
        let dir = tempfile::tempdir().unwrap();
        let records = records(dir.path());
        let analyst = register(&records, "lab@example.org", Role::BioAnalyst);
        let pat = register(&records, "pat@example.org", Role::Patient);
        let patient = records.create_patient_profile(&pat, sample_profile()).unwrap();

        let meta = NewLabTest {
            patient_id: patient.id,
            test_name: "Complete blood count".into(),
            notes: Some("fasting".into()),
        };
        let test = records
            .create_lab_test(&analyst, meta, upload(b"wbc,rbc\n5.1,4.7\n"))
            .unwrap();
        assert_eq!(test.size_bytes, 16);
        assert_eq!(test.bio_analyst_id, analyst.id);
        assert!(records.lab_results().exists(&test.file_ref));

        let file = records.lab_test_file(test.id).unwrap();
        assert_eq!(file.filename, "cbc.csv");
        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.bytes, b"wbc,rbc\n5.1,4.7\n");

        assert_eq!(records.lab_tests_for_patient(patient.id).unwrap().len(), 1);
        assert_eq!(records.patient_lab_tests(&pat).unwrap().len(), 1);
        assert_eq!(records.list_lab_tests().unwrap().len(), 1);
    }

    #[test]
    fn test_rejected_uploads_store_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let records = records(dir.path());
        let analyst = register(&records, "lab@example.org", Role::BioAnalyst);

        let unknown_patient = NewLabTest {
            patient_id: 5,
            test_name: "Lipids".into(),
            notes: None,
        };
        assert!(matches!(
            records.create_lab_test(&analyst, unknown_patient.clone(), upload(b"x")),
            Err(MedRecError::NotFound(_))
        ));
        assert!(matches!(
            records.create_lab_test(&analyst, unknown_patient, upload(b"")),
            Err(MedRecError::InvalidInput(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_tampered_file_fails_download() {
        let dir = tempfile::tempdir().unwrap();
        let records = records(dir.path());
        let analyst = register(&records, "lab@example.org", Role::BioAnalyst);
        let pat = register(&records, "pat@example.org", Role::Patient);
        let patient = records.create_patient_profile(&pat, sample_profile()).unwrap();

        let meta = NewLabTest {
            patient_id: patient.id,
            test_name: "Glucose".into(),
            notes: None,
        };
        let test = records.create_lab_test(&analyst, meta, upload(b"5.4")).unwrap();
        std::fs::write(dir.path().join(&test.file_ref), b"9.9").unwrap();

        assert!(matches!(
            records.lab_test_file(test.id),
            Err(MedRecError::StorageFailure(_))
        ));
        assert!(matches!(records.lab_test_file(99), Err(MedRecError::NotFound(_))));
    }
}
