use tracing::{info, instrument};

use edugest_academics::ClassGroup;
use edugest_core::{EnrollmentId, Page, PageRequest, StudentId};
use edugest_enrollment::{
    Enrollment, NewEnrollment, NewStudent, Student, StudentPatch, TransferEnrollment,
};

use super::{SchoolService, ServiceResult};
use crate::store::{CascadeSummary, Filter, ListQuery};

impl SchoolService {
    // --- students ---------------------------------------------------------

    pub async fn create_student(&self, input: NewStudent) -> ServiceResult<Student> {
        let student = Student::create(input, self.now())?;
        self.insert(&student).await?;
        Ok(student)
    }

    pub async fn update_student(
        &self,
        id: StudentId,
        patch: StudentPatch,
    ) -> ServiceResult<Student> {
        let mut student = self.get::<Student>(id).await?;
        student.apply(patch, self.now())?;
        self.save(&student).await?;
        Ok(student)
    }

    /// Removes the student and the enrollment history. Students that were
    /// invoiced are kept for the fiscal record.
    #[instrument(skip(self), err)]
    pub async fn delete_student(&self, id: StudentId) -> ServiceResult<CascadeSummary> {
        let summary = self.store.delete_student_cascade(id).await?;
        info!(removed = summary.total(), "{}", summary.message());
        Ok(summary)
    }

    pub async fn student_enrollments(
        &self,
        id: StudentId,
        page: PageRequest,
    ) -> ServiceResult<Page<Enrollment>> {
        self.exists::<Student>(id).await?;
        self.list::<Enrollment>(ListQuery::paged(page).filter(Filter::Student(id)))
            .await
    }

    // --- enrollments ------------------------------------------------------

    #[instrument(
        skip(self, input),
        fields(student_id = %input.student_id, class_group_id = %input.class_group_id),
        err
    )]
    pub async fn enroll(&self, input: NewEnrollment) -> ServiceResult<Enrollment> {
        let student = self.get::<Student>(input.student_id).await?;
        let group = self.get::<ClassGroup>(input.class_group_id).await?;
        let active = self.store.count_active_enrollments(group.id).await?;

        let enrollment = Enrollment::create(&student, &group, active, input.enrolled_on, self.now())?;
        self.store.place_enrollment(&enrollment, true).await?;
        info!(enrollment_id = %enrollment.id, "student enrolled");
        Ok(enrollment)
    }

    #[instrument(skip(self), err)]
    pub async fn cancel_enrollment(&self, id: EnrollmentId) -> ServiceResult<Enrollment> {
        let mut enrollment = self.get::<Enrollment>(id).await?;
        enrollment.cancel(self.now())?;
        self.save(&enrollment).await?;
        Ok(enrollment)
    }

    /// The student leaves the school; the seat is released.
    #[instrument(skip(self), err)]
    pub async fn transfer_out(&self, id: EnrollmentId) -> ServiceResult<Enrollment> {
        let mut enrollment = self.get::<Enrollment>(id).await?;
        enrollment.transfer_out(self.now())?;
        self.save(&enrollment).await?;
        Ok(enrollment)
    }

    /// Moves an active enrollment to another group of the same school year.
    #[instrument(skip(self, input), fields(target = %input.class_group_id), err)]
    pub async fn transfer_enrollment(
        &self,
        id: EnrollmentId,
        input: TransferEnrollment,
    ) -> ServiceResult<Enrollment> {
        let mut enrollment = self.get::<Enrollment>(id).await?;
        let target = self.get::<ClassGroup>(input.class_group_id).await?;
        let active = self.store.count_active_enrollments(target.id).await?;

        enrollment.transfer(&target, active, self.now())?;
        self.store.place_enrollment(&enrollment, false).await?;
        Ok(enrollment)
    }

    pub async fn delete_enrollment(&self, id: EnrollmentId) -> ServiceResult<()> {
        self.remove::<Enrollment>(id).await
    }
}
